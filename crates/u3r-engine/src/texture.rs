use crate::device::{Context, TextureDesc, TextureId};

/// Color channels per pixel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ColorMode {
    Rgb,
    #[default]
    Rgba,
}

impl ColorMode {
    #[inline]
    pub fn components(self) -> u32 {
        match self {
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }
}

/// Storage of one color component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum DataType {
    #[default]
    U8,
    U16,
}

impl DataType {
    #[inline]
    pub fn bytes_per_component(self) -> u32 {
        match self {
            DataType::U8 => 1,
            DataType::U16 => 2,
        }
    }
}

/// Sampling filter used when the texture is read by a shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

#[inline]
pub(crate) fn bytes_per_pixel(color_mode: ColorMode, data_type: DataType) -> usize {
    (color_mode.components() * data_type.bytes_per_component()) as usize
}

/// CPU-side pixel buffer and its device-resident image.
///
/// `set_data` declares the format and allocates the buffer; the caller fills
/// it through [`data_mut`](Self::data_mut) and commits with
/// [`upload`](Self::upload). The device image is released on drop.
///
/// Textures are typically shared between render objects through
/// [`Shared`](crate::Shared).
#[derive(Debug)]
pub struct Texture {
    ctx: Context,
    width: u32,
    height: u32,
    color_mode: ColorMode,
    data_type: DataType,
    filter: FilterMode,
    data: Vec<u8>,
    handle: Option<TextureId>,
}

impl Texture {
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            width: 0,
            height: 0,
            color_mode: ColorMode::default(),
            data_type: DataType::default(),
            filter: FilterMode::default(),
            data: Vec::new(),
            handle: None,
        }
    }

    /// Declares dimensions and format and allocates a zeroed pixel buffer of
    /// `width * height * bytes_per_pixel` bytes.
    pub fn set_data(&mut self, width: u32, height: u32, color_mode: ColorMode, data_type: DataType) {
        self.width = width;
        self.height = height;
        self.color_mode = color_mode;
        self.data_type = data_type;

        let len = width as usize * height as usize * bytes_per_pixel(color_mode, data_type);
        self.data.clear();
        self.data.resize(len, 0);
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    /// Pixel bytes, row-major, tightly packed.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    /// Commits the pixel buffer to the device, replacing an earlier upload.
    pub fn upload(&mut self) {
        self.release();

        let desc = TextureDesc {
            width: self.width,
            height: self.height,
            color_mode: self.color_mode,
            data_type: self.data_type,
            filter: self.filter,
        };
        self.handle = Some(self.ctx.backend().create_texture(&desc, &self.data));

        log::debug!(
            "texture uploaded: {}x{} {:?}/{:?}",
            self.width,
            self.height,
            self.color_mode,
            self.data_type
        );
    }

    pub fn is_uploaded(&self) -> bool {
        self.handle.is_some()
    }

    #[cfg(test)]
    pub(crate) fn handle(&self) -> Option<TextureId> {
        self.handle
    }

    fn release(&mut self) {
        if let Some(id) = self.handle.take() {
            self.ctx.backend().delete_texture(id);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::device::HeadlessBackend;

    fn headless() -> (Rc<HeadlessBackend>, Context) {
        let backend = Rc::new(HeadlessBackend::new());
        let ctx = Context::from_shared(backend.clone());
        (backend, ctx)
    }

    #[test]
    fn set_data_allocates_exact_size() {
        let (_, ctx) = headless();
        let mut tex = Texture::new(&ctx);

        tex.set_data(4, 2, ColorMode::Rgb, DataType::U8);
        assert_eq!(tex.data().len(), 4 * 2 * 3);

        tex.set_data(4, 2, ColorMode::Rgba, DataType::U16);
        assert_eq!(tex.data().len(), 4 * 2 * 4 * 2);
        assert!(tex.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn upload_replaces_previous_image() {
        let (backend, ctx) = headless();
        let mut tex = Texture::new(&ctx);
        tex.set_data(2, 2, ColorMode::Rgba, DataType::U8);
        tex.data_mut()[0] = 200;

        tex.upload();
        tex.upload();

        assert_eq!(backend.live_textures(), 1);
        let id = tex.handle().unwrap();
        assert_eq!(backend.texture_size(id), Some(16));
    }

    #[test]
    fn drop_releases_device_image() {
        let (backend, ctx) = headless();
        {
            let mut tex = Texture::new(&ctx);
            tex.set_data(1, 1, ColorMode::Rgb, DataType::U8);
            tex.upload();
            assert_eq!(backend.live_textures(), 1);
        }
        assert_eq!(backend.live_textures(), 0);
    }
}
