use super::Viewer;
use crate::error::Result;
use log::{debug, info, warning};
use opencv::core::{self, CV_8UC3, Mat, Point, Scalar, Size, Vector};
use opencv::imgcodecs;
use opencv::imgproc;
use opencv::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// Height of the caption band drawn above every tile
const CAPTION_BAND: i32 = 24;

#[derive(Debug, Clone)]
pub struct GridOptions {
    pub columns: usize,
    pub tile_size: i32,
    pub window: String,
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Caption of an image: its file name up to the first dot, which is the
/// label for captured images.
pub fn caption(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_owned))
        .unwrap_or_default()
}

/// `(rows, columns)` needed to fit `count` images in `columns` columns.
pub fn grid_shape(count: usize, columns: usize) -> (usize, usize) {
    let columns = columns.max(1);
    (count.div_ceil(columns), columns)
}

/// Decodes every image in parallel; undecodable files are skipped.
pub fn load_tiles(paths: &[PathBuf]) -> Vec<(String, Mat)> {
    paths
        .par_iter()
        .map(|path| {
            let img = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_COLOR);
            (path, img)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .filter_map(|(path, img)| match img {
            Ok(img) if !img.empty() => Some((caption(path), img)),
            Ok(_) => {
                warning!("Could not decode {}", path.display());
                None
            }
            Err(e) => {
                warning!("Could not read {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn blank_cell(tile_size: i32) -> opencv::Result<Mat> {
    Mat::new_rows_cols_with_default(tile_size + CAPTION_BAND, tile_size, CV_8UC3, Scalar::all(0.))
}

fn render_cell(caption: &str, img: &Mat, tile_size: i32) -> opencv::Result<Mat> {
    let mut resized = Mat::default();
    imgproc::resize(
        img,
        &mut resized,
        Size::new(tile_size, tile_size),
        0.,
        0.,
        imgproc::INTER_AREA,
    )?;

    let mut cell = Mat::default();
    core::copy_make_border(
        &resized,
        &mut cell,
        CAPTION_BAND,
        0,
        0,
        0,
        core::BORDER_CONSTANT,
        Scalar::all(0.),
    )?;

    imgproc::put_text(
        &mut cell,
        caption,
        Point::new(4, CAPTION_BAND - 7),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.5,
        Scalar::new(255., 255., 255., 0.),
        1,
        imgproc::LINE_AA,
        false,
    )?;
    Ok(cell)
}

/// Lays the captioned tiles out row by row; trailing cells stay black.
pub fn compose_grid(tiles: &[(String, Mat)], columns: usize, tile_size: i32) -> opencv::Result<Mat> {
    let (rows, columns) = grid_shape(tiles.len(), columns);
    let mut row_mats = Vector::<Mat>::new();

    for row in 0..rows {
        let mut cells = Vector::<Mat>::new();
        for col in 0..columns {
            let cell = match tiles.get(row * columns + col) {
                Some((caption, img)) => render_cell(caption, img, tile_size)?,
                None => blank_cell(tile_size)?,
            };
            cells.push(cell);
        }
        let mut row_mat = Mat::default();
        core::hconcat(&cells, &mut row_mat)?;
        row_mats.push(row_mat);
    }

    let mut grid = Mat::default();
    core::vconcat(&row_mats, &mut grid)?;
    Ok(grid)
}

/// Shows every image of `dir` in a captioned grid and waits for a key press.
/// Returns the number of images shown.
pub fn display_images<V: Viewer>(dir: &Path, viewer: &mut V, opts: &GridOptions) -> Result<usize> {
    let paths = list_images(dir)?;
    debug!("Found {} image files in {}", paths.len(), dir.display());

    let tiles = load_tiles(&paths);
    if tiles.is_empty() {
        warning!("No displayable images in {}", dir.display());
        return Ok(0);
    }

    let (rows, columns) = grid_shape(tiles.len(), opts.columns);
    info!("Showing {} images in a {}x{} grid", tiles.len(), rows, columns);

    let grid = compose_grid(&tiles, opts.columns, opts.tile_size)?;
    viewer.show(&opts.window, &grid)?;
    viewer.poll_key(0)?;
    viewer.close()?;

    Ok(tiles.len())
}
