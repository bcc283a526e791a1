//! CLI command implementations.

mod convert;
mod publish;

pub(crate) use convert::ConvertArgs;
pub(crate) use publish::PublishArgs;

use mdkms_config::Config;
use mdkms_renderer::{ConverterOptions, ImageSizing};

/// Converter options from the `[render]` section.
fn converter_options(config: &Config) -> ConverterOptions {
    ConverterOptions {
        footnotes: config.render.footnotes,
        ..ConverterOptions::default()
    }
}

/// Image sizing from the `[images]` section.
fn image_sizing(config: &Config) -> ImageSizing {
    let images = &config.images;
    ImageSizing {
        max_width: images.max_width,
        max_height: images.max_height,
        min_scale: images.min_scale,
        derive: images.derive_size,
    }
}
