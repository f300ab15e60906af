use super::infer::Detector;
use super::tensor_view::TensorView;
use crate::conf::ModelConf;
use crate::error::Result as CrateResult;
use anyhow::{Result, anyhow};
use log::{debug, error, info};
use opencv::core::{CV_32F, Mat, Point, Rect, Scalar, Size, Vector};
use opencv::dnn;
use opencv::imgproc;
use opencv::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// BGR colors cycled by class id
const PALETTE: [(f64, f64, f64); 8] = [
    (56., 56., 255.),
    (151., 157., 255.),
    (31., 112., 255.),
    (29., 178., 255.),
    (49., 210., 207.),
    (10., 249., 72.),
    (23., 204., 146.),
    (134., 219., 61.),
];

#[derive(Debug, Clone, PartialEq)]
pub struct BoxDetection {
    pub rect: Rect,
    pub class_id: usize,
    pub confidence: f32,
}

/// Detections for one frame plus the class names needed to label them.
#[derive(Debug, Clone)]
pub struct Predictions {
    pub detections: Vec<BoxDetection>,
    names: Arc<[String]>,
}

impl Predictions {
    pub fn new(detections: Vec<BoxDetection>, names: Arc<[String]>) -> Self {
        Self { detections, names }
    }

    pub fn label(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class {class_id}"))
    }

    /// Returns a copy of `frame` with boxes and labels drawn on it.
    pub fn plot(&self, frame: &Mat) -> CrateResult<Mat> {
        let mut annotated = frame.try_clone()?;

        for det in &self.detections {
            let (b, g, r) = PALETTE[det.class_id % PALETTE.len()];
            let color = Scalar::new(b, g, r, 0.);
            imgproc::rectangle(&mut annotated, det.rect, color, 2, imgproc::LINE_8, 0)?;

            let text = format!("{} {:.2}", self.label(det.class_id), det.confidence);
            let mut baseline = 0;
            let size = imgproc::get_text_size(
                &text,
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                1,
                &mut baseline,
            )?;
            let top = (det.rect.y - size.height - baseline).max(0);
            let background = Rect::new(det.rect.x, top, size.width, size.height + baseline);
            imgproc::rectangle(&mut annotated, background, color, imgproc::FILLED, imgproc::LINE_8, 0)?;
            imgproc::put_text(
                &mut annotated,
                &text,
                Point::new(det.rect.x, top + size.height),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                Scalar::new(255., 255., 255., 0.),
                1,
                imgproc::LINE_AA,
                false,
            )?;
        }

        Ok(annotated)
    }
}

/// YOLO-style detector loaded from ONNX weights through OpenCV DNN.
///
/// The network output is expected as `[1, 4 + classes, anchors]` with box
/// centers and sizes in input pixels, followed by one score per class.
pub struct Net {
    net: dnn::Net,
    input_size: i32,
    confidence: f32,
    iou: f32,
    names: Arc<[String]>,
}

impl Net {
    pub fn from_weights(weights: &Path, conf: &ModelConf) -> CrateResult<Self> {
        debug!("Loading detection model from '{}'", weights.display());
        let start_time = Instant::now();

        let net = match dnn::read_net_from_onnx(&weights.to_string_lossy()) {
            Ok(net) => {
                info!("Detection model loaded in {:?}", start_time.elapsed());
                net
            }
            Err(e) => {
                error!("Failed to load detection model: {}", e);
                return Err(e.into());
            }
        };

        Ok(Self {
            net,
            input_size: conf.input_size,
            confidence: conf.confidence,
            iou: conf.iou,
            names: conf.class_names.clone().into(),
        })
    }

    fn forward(&mut self, frame: &Mat) -> opencv::Result<Mat> {
        let blob = dnn::blob_from_image(
            frame,
            1.0 / 255.0,
            Size::new(self.input_size, self.input_size),
            Scalar::default(),
            true,
            false,
            CV_32F,
        )?;
        self.net.set_input_def(&blob)?;

        let names = self.net.get_unconnected_out_layers_names()?;
        let mut outputs = Vector::<Mat>::new();
        self.net.forward(&mut outputs, &names)?;
        outputs.get(0)
    }
}

impl Detector for Net {
    fn predict(&mut self, frame: &Mat) -> Result<Vec<Predictions>> {
        let start = Instant::now();
        let output = self.forward(frame)?;
        let view = TensorView::<f32>::new(&output)?;

        let scale_x = frame.cols() as f32 / self.input_size as f32;
        let scale_y = frame.rows() as f32 / self.input_size as f32;
        let candidates = decode_output(&view, self.confidence, (scale_x, scale_y))?;
        let detections = non_max_suppression(candidates, self.confidence, self.iou)?;

        debug!("{} detections in {:?}", detections.len(), start.elapsed());
        Ok(vec![Predictions::new(detections, Arc::clone(&self.names))])
    }
}

/// Turns a `[1, 4 + classes, anchors]` output into boxes in frame
/// coordinates, keeping anchors whose best class score reaches `confidence`.
pub fn decode_output(
    view: &TensorView<f32>,
    confidence: f32,
    (scale_x, scale_y): (f32, f32),
) -> Result<Vec<BoxDetection>> {
    let dims = view.dims();
    if dims.len() != 3 {
        return Err(anyhow!("Unexpected output shape {:?}", dims));
    }
    let channels = dims[1];
    let anchors = dims[2];
    if channels < 5 {
        return Err(anyhow!("Output needs at least 5 channels, got {}", channels));
    }

    let mut detections = Vec::new();
    for i in 0..anchors {
        let mut best = (0usize, f32::MIN);
        for c in 4..channels {
            let score = *view.get(&[0, c, i])?;
            if score > best.1 {
                best = ((c - 4) as usize, score);
            }
        }
        if best.1 < confidence {
            continue;
        }

        let cx = *view.get(&[0, 0, i])?;
        let cy = *view.get(&[0, 1, i])?;
        let w = *view.get(&[0, 2, i])?;
        let h = *view.get(&[0, 3, i])?;

        detections.push(BoxDetection {
            rect: Rect::new(
                ((cx - w / 2.) * scale_x).round() as i32,
                ((cy - h / 2.) * scale_y).round() as i32,
                (w * scale_x).round() as i32,
                (h * scale_y).round() as i32,
            ),
            class_id: best.0,
            confidence: best.1,
        });
    }

    Ok(detections)
}

fn non_max_suppression(candidates: Vec<BoxDetection>, confidence: f32, iou: f32) -> opencv::Result<Vec<BoxDetection>> {
    let boxes: Vector<Rect> = candidates.iter().map(|d| d.rect).collect();
    let scores: Vector<f32> = candidates.iter().map(|d| d.confidence).collect();
    let mut keep = Vector::<i32>::new();
    dnn::nms_boxes(&boxes, &scores, confidence, iou, &mut keep, 1.0, 0)?;

    Ok(keep
        .iter()
        .filter_map(|idx| candidates.get(idx as usize).cloned())
        .collect())
}
