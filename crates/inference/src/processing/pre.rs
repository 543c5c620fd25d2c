use crate::processing::post::TransformParams;
use image::{DynamicImage, Rgb, RgbImage, imageops};
use ndarray::{Array, IxDyn};

const LETTERBOX_COLOR: u8 = 114;

pub struct PreProcessor {
    pub input_size: (u32, u32),
}

impl PreProcessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    /// Letterbox the image to the model input size and normalize it into an
    /// NCHW f32 array in [0,1]. Returns the array together with the
    /// transform parameters needed to map detections back.
    pub fn preprocess(
        &self,
        image: &DynamicImage,
    ) -> anyhow::Result<(Array<f32, IxDyn>, TransformParams)> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let (input_w, input_h) = self.input_size;

        tracing::trace!(width, height, "Preprocessing image");

        let scale = (input_w as f32 / width as f32).min(input_h as f32 / height as f32);
        let new_width = ((width as f32 * scale) as u32).max(1);
        let new_height = ((height as f32 * scale) as u32).max(1);

        let offset_x = (input_w - new_width) / 2;
        let offset_y = (input_h - new_height) / 2;

        let resized = imageops::resize(&rgb, new_width, new_height, imageops::FilterType::Triangle);

        let mut canvas = RgbImage::from_pixel(input_w, input_h, Rgb([LETTERBOX_COLOR; 3]));
        imageops::replace(&mut canvas, &resized, offset_x as i64, offset_y as i64);

        let input = Self::normalize(&canvas)?;

        let transform = TransformParams {
            orig_width: width,
            orig_height: height,
            scale,
            offset_x: offset_x as f32,
            offset_y: offset_y as f32,
        };

        Ok((input, transform))
    }

    fn normalize(image: &RgbImage) -> anyhow::Result<Array<f32, IxDyn>> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];
        let buf = image.as_raw();

        for (i, px) in buf.chunks_exact(3).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, 3, height, width]),
            output,
        )?)
    }
}
