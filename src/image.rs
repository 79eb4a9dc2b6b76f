use crate::{
    error::PDFError,
    object::{Dictionary, Name, ObjectId, Stream},
    resources::image::{ImageData, ImageEncoding},
    sink::ByteSink,
    writer::ObjectWriter,
};

/// Index of an image loaded into a document. Content refers to it as `/I{index}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub(crate) usize);

impl ImageId {
    pub fn index(&self) -> usize {
        self.0
    }
}

fn image_dict(data: &ImageData, colour_space: &str, interpolate: bool) -> Dictionary {
    let mut dict = Dictionary::new()
        .with("Type", Name::from("XObject"))
        .with("Subtype", Name::from("Image"))
        .with("Width", data.width)
        .with("Height", data.height)
        .with("ColorSpace", Name::from(colour_space))
        .with("BitsPerComponent", 8);
    if interpolate {
        dict.set("Interpolate", true);
    }
    dict
}

/// Commit the image XObject `id`, plus its soft mask when the image has alpha
pub(crate) fn write_image<S: ByteSink>(
    writer: &mut ObjectWriter<S>,
    id: ObjectId,
    data: &ImageData,
    interpolate: bool,
) -> Result<(), PDFError> {
    match &data.encoding {
        ImageEncoding::Jpeg(bytes) => writer.commit(
            id,
            Stream::new(image_dict(data, "DeviceRGB", interpolate), bytes.clone()).pre_encoded("DCTDecode"),
        ),
        ImageEncoding::Raw { rgb, alpha } => {
            let mut dict = image_dict(data, "DeviceRGB", interpolate);
            let mask_id = alpha.as_ref().map(|_| writer.allocate_id());
            if let Some(mask_id) = mask_id {
                dict.set("SMask", mask_id);
            }
            writer.commit(id, Stream::new(dict, rgb.clone()))?;

            // add a transparency mask if we have one
            if let (Some(mask_id), Some(alpha)) = (mask_id, alpha) {
                writer.commit(
                    mask_id,
                    Stream::new(image_dict(data, "DeviceGray", interpolate), alpha.clone()),
                )?;
            }
            Ok(())
        }
    }
}
