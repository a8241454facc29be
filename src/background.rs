//! Background geometry: center crop to the frame ratio and the bottom shadow.

/// Pixel rectangle cut out of the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Largest centered rectangle of the source with the target's aspect ratio.
/// Wide sources lose their sides, tall sources lose top and bottom.
pub fn center_crop(src_width: u32, src_height: u32, target_width: u32, target_height: u32) -> CropRect {
    let src_w = f64::from(src_width);
    let src_h = f64::from(src_height);
    let target_ratio = f64::from(target_width) / f64::from(target_height);

    if src_w / src_h > target_ratio {
        let width = src_h * target_ratio;
        CropRect {
            x: (src_w - width) / 2.0,
            y: 0.0,
            width,
            height: src_h,
        }
    } else {
        let height = src_w / target_ratio;
        CropRect {
            x: 0.0,
            y: (src_h - height) / 2.0,
            width: src_w,
            height,
        }
    }
}

/// ffmpeg filter chain cropping `crop` and scaling to the target frame
pub fn conform_filter(crop: &CropRect, target_width: u32, target_height: u32) -> String {
    format!(
        "crop={:.3}:{:.3}:{:.3}:{:.3},scale={}:{},setsar=1",
        crop.width, crop.height, crop.x, crop.y, target_width, target_height
    )
}

/// Vertical darkening gradient anchored at the bottom of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BottomShadow {
    frame_height: u32,
    clear_rows: u32,
    shadow_rows: u32,
    darkness: f64,
}

impl BottomShadow {
    /// `darkness` is the opacity reached on the last row, `coverage` the
    /// fraction of the frame height the gradient spans
    pub fn new(frame_height: u32, darkness: f64, coverage: f64) -> Self {
        let shadow_rows = ((f64::from(frame_height) * coverage) as u32).min(frame_height);
        Self {
            frame_height,
            clear_rows: frame_height - shadow_rows,
            shadow_rows,
            darkness,
        }
    }

    pub fn clear_rows(&self) -> u32 {
        self.clear_rows
    }

    /// Opacity of row `y`: zero above the shadow, then evenly spaced from 0
    /// to `darkness` inclusive
    pub fn alpha_at(&self, y: u32) -> f64 {
        if y < self.clear_rows || y >= self.frame_height {
            return 0.0;
        }
        if self.shadow_rows == 1 {
            return 0.0;
        }

        let step = self.darkness / f64::from(self.shadow_rows - 1);
        f64::from(y - self.clear_rows) * step
    }

    /// `geq` alpha expression (0..255) producing the same gradient
    pub fn alpha_expression(&self) -> String {
        if self.shadow_rows <= 1 {
            return "0".to_string();
        }

        let step = 255.0 * self.darkness / f64::from(self.shadow_rows - 1);
        format!(
            "if(lt(Y\\,{clear})\\,0\\,(Y-{clear})*{step:.6})",
            clear = self.clear_rows,
            step = step
        )
    }

    /// Filter graph source producing the shadow layer at `width` x frame height
    pub fn source_filter(&self, width: u32) -> String {
        format!(
            "color=c=black:s={}x{},format=rgba,geq=r=0:g=0:b=0:a='{}'",
            width,
            self.frame_height,
            self.alpha_expression()
        )
    }
}
