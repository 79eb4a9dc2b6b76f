use crate::{
    colour::ProfileId,
    config::{ExecContext, Profile},
    content::{render_contents, RenderFont},
    destination::Destination,
    encoding::{self, TextEncoding},
    error::{ConfigurationError, PDFError, ResourceError, SerializationError},
    filter::{FilterKind, PipelineSpec},
    font::{write_font, FontId},
    image::{write_image, ImageId},
    info::Info,
    message::{codes, Severity},
    object::{Dictionary, Name, Object, ObjectId, PdfString, Stream},
    outline::{BookmarkId, BookmarkStyle, Outline},
    page::{Page, SpanFont, SpanLayout},
    resources::{
        fontspec::FontSpec,
        icc::ProfileSpec,
        image::ImageSpec,
        typeman::{ResolvedFont, UsedGlyphs},
        ResourceContext, ResourceHandle, ResourceSpec,
    },
    security::{self, SecurityHandler},
    sink::{ByteSink, CountingSink, FileSink},
    units::Pt,
    writer::{ObjectWriter, Trailer},
    Colour,
};
use id_arena::{Arena, Id};
use indexmap::IndexMap;
use std::{
    collections::{BTreeSet, HashMap},
    io::Write,
    path::Path,
    sync::Arc,
};

struct DocFont {
    requested: FontSpec,
    /// `None` when neither the font nor the fallback could be loaded
    resolved: Option<ResolvedFont>,
}

struct DocProfile {
    handle: ResourceHandle,
    /// False when the configured version is too low for ICC based colour; the
    /// profile's device space is used instead
    icc: bool,
}

/// A document is the main object that stores all the contents of the PDF
/// then renders it out with a call to [Document::write]
///
/// Fonts, images and colour profiles are held in a [ResourceContext], which may be
/// shared with other documents. Nothing is serialized before [Document::write]: ids,
/// filters and encryption are all applied in that one pass.
pub struct Document {
    exec: ExecContext,
    resources: Arc<ResourceContext>,
    security: Option<SecurityHandler>,
    pipeline: PipelineSpec,
    file_id: [u8; 16],
    pub info: Info,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub outline: Outline,
    fonts: Vec<DocFont>,
    images: Vec<ResourceHandle>,
    profiles: Vec<DocProfile>,
    output_intents: Vec<ProfileId>,
    finalized: bool,
}

impl Document {
    /// A document configured by `profile`, using the process-wide resource context
    pub fn new(profile: Profile) -> Result<Document, PDFError> {
        Document::with_resources(profile, ResourceContext::shared_default())
    }

    pub fn with_resources(profile: Profile, resources: Arc<ResourceContext>) -> Result<Document, PDFError> {
        Document::with_context(ExecContext::new(profile), resources)
    }

    /// Validates the configuration up front: encryption settings and the filter
    /// pipeline are rejected here rather than at [Document::write]
    pub fn with_context(exec: ExecContext, resources: Arc<ResourceContext>) -> Result<Document, PDFError> {
        let profile = exec.profile();
        let file_id = security::file_id(profile.get_bool("doc.static_file_id")?);
        let security = SecurityHandler::from_profile(profile, &file_id)?;

        let mut kinds = Vec::new();
        if profile.get_bool("doc.compressed")? {
            kinds.push(FilterKind::Flate);
        }
        if security.is_some() {
            kinds.push(FilterKind::ArcFour);
        }
        let pipeline = PipelineSpec::new(&kinds, security.as_ref().map(|s| s.key()))?;
        let info = Info::from_profile(profile)?;

        Ok(Document {
            exec,
            resources,
            security,
            pipeline,
            file_id,
            info,
            pages: Arena::new(),
            page_order: Vec::new(),
            outline: Outline::default(),
            fonts: Vec::new(),
            images: Vec::new(),
            profiles: Vec::new(),
            output_intents: Vec::new(),
            finalized: false,
        })
    }

    pub fn exec(&self) -> &ExecContext {
        &self.exec
    }

    pub fn resources(&self) -> &Arc<ResourceContext> {
        &self.resources
    }

    /// Replace the metadata taken from the `info.*` options
    pub fn set_info(&mut self, info: Info) {
        self.info = info;
    }

    /// Load a font from a spec string such as `standard;name=Times-Roman;size=11` or
    /// `file=/fonts/a.ttf;size=9;bold`.
    ///
    /// A font that cannot be loaded (and whose `fonts.fallback` cannot be loaded either)
    /// is reported through the message sink and still gets an id: the document only
    /// fails if text is actually drawn with it.
    pub fn font_load(&mut self, spec: &str) -> Result<FontId, PDFError> {
        let spec: FontSpec = spec.parse()?;
        self.font_load_spec(spec)
    }

    pub fn font_load_spec(&mut self, spec: FontSpec) -> Result<FontId, PDFError> {
        if let Some(encoding) = &spec.encoding {
            TextEncoding::from_name(encoding)?;
        }
        let resolved = match self.resources.resolve_font(&spec, &self.exec) {
            Ok(resolved) => Some(resolved),
            Err(e @ ResourceError::SynthesisDisabled(_)) => return Err(e.into()),
            Err(e) => {
                log::debug!("font {} unresolved: {e}", spec.source);
                None
            }
        };
        self.fonts.push(DocFont {
            requested: spec,
            resolved,
        });
        Ok(FontId(self.fonts.len() - 1))
    }

    /// The font named by `fonts.default`
    pub fn default_font(&mut self) -> Result<FontId, PDFError> {
        let spec = self.exec.profile().get("fonts.default")?.to_string();
        self.font_load(&spec)
    }

    pub fn is_font_resolved(&self, font: FontId) -> bool {
        self.fonts
            .get(font.index())
            .map(|f| f.resolved.is_some())
            .unwrap_or(false)
    }

    /// The spec a font resolved to, which differs from the requested one after a
    /// fallback
    pub fn font_spec(&self, font: FontId) -> Option<&FontSpec> {
        let font = self.fonts.get(font.index())?;
        Some(font.resolved.as_ref().map(|r| &r.spec).unwrap_or(&font.requested))
    }

    /// Lay out `text` at a baseline position in the font's own size
    pub fn span<S: Into<String>>(&self, font: FontId, text: S, coords: (Pt, Pt), colour: Colour) -> SpanLayout {
        let size = self.font_spec(font).map(|spec| spec.size.0).unwrap_or(12.0);
        SpanLayout {
            text: text.into(),
            font: SpanFont { id: font, size: Pt(size) },
            colour,
            coords,
        }
    }

    /// Decode byte text in the font's `enc`, or in the default text encoding
    pub fn decode_text(&self, font: Option<FontId>, bytes: &[u8]) -> String {
        let encoding = font
            .and_then(|font| self.fonts.get(font.index()))
            .and_then(|font| font.requested.encoding.as_deref())
            .and_then(|name| TextEncoding::from_name(name).ok())
            .unwrap_or_else(|| self.exec.default_text_encoding());
        encoding::decode(bytes, encoding)
    }

    fn image_load(&mut self, spec: ImageSpec) -> Result<ImageId, PDFError> {
        let handle = self.resources.get_or_create(&ResourceSpec::Image(spec))?;
        self.images.push(handle);
        Ok(ImageId(self.images.len() - 1))
    }

    /// Load an image from disk. RGB JPEGs are embedded as they are, anything else the
    /// `image` crate can read is embedded as 8-bit RGB with an alpha mask if needed.
    pub fn image_load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<ImageId, PDFError> {
        self.image_load(ImageSpec::file(path.as_ref()))
    }

    pub fn image_load_bytes(&mut self, bytes: Arc<[u8]>) -> Result<ImageId, PDFError> {
        self.image_load(ImageSpec::bytes(bytes))
    }

    /// Load an ICC profile for use in [Colour::Icc] colours and output intents
    pub fn color_profile_load(&mut self, spec: ProfileSpec) -> Result<ProfileId, PDFError> {
        let icc = self.exec.ensure_version("ICC based colour spaces", 3)?;
        let handle = self.resources.get_or_create(&ResourceSpec::Profile(spec))?;
        self.profiles.push(DocProfile { handle, icc });
        Ok(ProfileId(self.profiles.len() - 1))
    }

    /// Name a loaded profile as the intended output condition
    pub fn add_output_intent(&mut self, profile: ProfileId) -> Result<(), PDFError> {
        if profile.index() >= self.profiles.len() {
            return Err(ResourceError::Profile(format!("no profile #{}", profile.index())).into());
        }
        if self.exec.ensure_version("output intents", 4)? && self.profiles[profile.index()].icc {
            self.output_intents.push(profile);
        }
        Ok(())
    }

    /// Add a page to the end of the document
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        let id = self.pages.alloc(page);
        self.page_order.push(id);
        id
    }

    /// Add a page to the document, inserting it before the page identified by `next`.
    /// If there is no page identified by `next`, the page will be added to the end of
    /// the document.
    pub fn insert_page_before_id(&mut self, page: Page, next: Id<Page>) -> Id<Page> {
        let id = self.pages.alloc(page);
        match self.index_of_page(next) {
            Some(index) => self.page_order.insert(index, id),
            None => self.page_order.push(id),
        }
        id
    }

    /// Add a page to the document, inserting it after the page identified by `previous`.
    /// If there is no page identified by `previous`, the page will be added to the end
    /// of the document.
    pub fn insert_page_after_id(&mut self, page: Page, previous: Id<Page>) -> Id<Page> {
        let id = self.pages.alloc(page);
        match self.index_of_page(previous) {
            Some(index) => self.page_order.insert(index + 1, id),
            None => self.page_order.push(id),
        }
        id
    }

    /// Get the 0-based index of a page given its ID. Note that changing the page order
    /// after this call _will_ invalidate the returned page index
    pub fn index_of_page(&self, page: Id<Page>) -> Option<usize> {
        self.page_order.iter().position(|p| *p == page)
    }

    pub fn id_of_page_index(&self, page_index: usize) -> Option<Id<Page>> {
        self.page_order.get(page_index).copied()
    }

    pub fn page_mut(&mut self, page: Id<Page>) -> Option<&mut Page> {
        self.pages.get_mut(page)
    }

    fn ensure_page(&self, page: Id<Page>) -> Result<&Page, ConfigurationError> {
        self.index_of_page(page)
            .and_then(|_| self.pages.get(page))
            .ok_or(ConfigurationError::UnknownPage(page.index()))
    }

    /// Add a bookmark in the document outline showing the top of a page. With a
    /// `parent` the bookmark is nested as its last child.
    pub fn add_bookmark<S: ToString>(
        &mut self,
        parent: Option<BookmarkId>,
        title: S,
        page: Id<Page>,
    ) -> Result<BookmarkId, PDFError> {
        let height = self.ensure_page(page)?.media_box.y2;
        Ok(self
            .outline
            .add_bookmark(parent, title.to_string(), Destination::top_of(page, height)))
    }

    pub fn add_bookmark_destination<S: ToString>(
        &mut self,
        parent: Option<BookmarkId>,
        title: S,
        destination: Destination,
    ) -> Result<BookmarkId, PDFError> {
        self.ensure_page(destination.page)?;
        Ok(self.outline.add_bookmark(parent, title.to_string(), destination))
    }

    /// Colour and font style of a bookmark's title, a PDF 1.4 feature
    pub fn set_bookmark_style(&mut self, bookmark: BookmarkId, style: BookmarkStyle) -> Result<(), PDFError> {
        if !self.exec.ensure_version("outline item style", 4)? {
            return Ok(());
        }
        if let Some(entry) = self.outline.get_mut(bookmark) {
            entry.style = style;
        }
        Ok(())
    }

    /// Write the entire document to the writer
    pub fn write<W: Write>(mut self, w: W) -> Result<W, PDFError> {
        let sink = self.finalize_to(CountingSink::new(w))?;
        Ok(sink.into_inner())
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, PDFError> {
        self.write(Vec::new())
    }

    pub fn save<P: AsRef<Path>>(mut self, path: P) -> Result<(), PDFError> {
        let mut sink = self.finalize_to(FileSink::create(path)?)?;
        sink.flush()?;
        Ok(())
    }

    /// Serialize the document into `sink`. A document can only be finalized once, a
    /// failed attempt included.
    pub fn finalize_to<S: ByteSink>(&mut self, sink: S) -> Result<S, PDFError> {
        if self.finalized {
            return Err(SerializationError::Finalized.into());
        }
        self.finalized = true;
        let mut writer = ObjectWriter::new(sink, self.exec.version(), self.pipeline.clone())?;

        if self.page_order.is_empty() {
            self.exec.warn(codes::EMPTY_DOCUMENT, "the document has no pages");
        }

        let catalog_id = writer.allocate_id();
        let page_tree_id = writer.allocate_id();

        let mut render_fonts: Vec<RenderFont> = self
            .fonts
            .iter()
            .map(|font| {
                let typeface = font
                    .resolved
                    .as_ref()
                    .and_then(|resolved| self.resources.typeface(resolved.handle));
                RenderFont::new(font.requested.source.to_string(), typeface)
            })
            .collect();

        // object ids of resources placed on some page, in first-use order. Fonts,
        // images and profiles loaded twice from the same spec share a handle, and so
        // one object.
        let mut font_ids: IndexMap<ResourceHandle, ObjectId> = IndexMap::new();
        let mut image_ids: IndexMap<ResourceHandle, ObjectId> = IndexMap::new();
        let mut profile_ids: IndexMap<ResourceHandle, ObjectId> = IndexMap::new();
        let mut fonts_shown: BTreeSet<usize> = BTreeSet::new();

        // allocated up front so links and bookmarks can point at later pages
        let page_refs: Vec<ObjectId> = self.page_order.iter().map(|_| writer.allocate_id()).collect();
        let page_ids: HashMap<Id<Page>, ObjectId> = self
            .page_order
            .iter()
            .copied()
            .zip(page_refs.iter().copied())
            .collect();

        for (id, &page_id) in self.page_order.iter().zip(page_refs.iter()) {
            let page = self
                .pages
                .get(*id)
                .ok_or(ConfigurationError::UnknownPage(id.index()))?;

            let content = render_contents(&page.contents, &mut render_fonts, &self.exec)?;

            let mut fonts = Dictionary::new();
            for index in page.fonts() {
                let handle = self
                    .fonts
                    .get(index)
                    .and_then(|font| font.resolved.as_ref())
                    .map(|resolved| resolved.handle)
                    .ok_or_else(|| ResourceError::Required(format!("font #{index}")))?;
                let id = *font_ids.entry(handle).or_insert_with(|| writer.allocate_id());
                fonts.set(format!("F{index}"), id);
                fonts_shown.insert(index);
            }
            let mut xobjects = Dictionary::new();
            for index in page.images() {
                let handle = *self
                    .images
                    .get(index)
                    .ok_or_else(|| ResourceError::Image(format!("no image #{index}")))?;
                let id = *image_ids.entry(handle).or_insert_with(|| writer.allocate_id());
                xobjects.set(format!("I{index}"), id);
            }
            let mut colour_spaces = Dictionary::new();
            for index in page.profiles() {
                let profile = self
                    .profiles
                    .get(index)
                    .ok_or_else(|| ResourceError::Profile(format!("no profile #{index}")))?;
                let space: Object = if profile.icc {
                    let id = *profile_ids.entry(profile.handle).or_insert_with(|| writer.allocate_id());
                    vec![Object::name("ICCBased"), id.into()].into()
                } else {
                    let alternate = self
                        .resources
                        .get(profile.handle)
                        .and_then(|r| r.as_profile().map(|p| p.alternate()))
                        .unwrap_or("DeviceRGB");
                    Object::name(alternate)
                };
                colour_spaces.set(format!("CS{index}"), space);
            }

            let mut resources = Dictionary::new();
            if !fonts.is_empty() {
                resources.set("Font", fonts);
            }
            if !xobjects.is_empty() {
                resources.set("XObject", xobjects);
            }
            if !colour_spaces.is_empty() {
                resources.set("ColorSpace", colour_spaces);
            }

            let mut page_dict = Dictionary::new()
                .with("Type", Name::from("Page"))
                .with("Parent", page_tree_id)
                .with("MediaBox", page.media_box)
                .with("Resources", resources);
            if !content.is_empty() {
                let content_id = writer.allocate_id();
                writer.commit(content_id, Stream::new(Dictionary::new(), content))?;
                page_dict.set("Contents", content_id);
            }
            let mut annots: Vec<Object> = Vec::with_capacity(page.links.len());
            for link in page.links.iter() {
                let annot_id = writer.allocate_id();
                writer.commit(annot_id, link.to_dictionary(&page_ids)?)?;
                annots.push(annot_id.into());
            }
            if !annots.is_empty() {
                page_dict.set("Annots", annots);
            }
            writer.commit(page_id, page_dict)?;
        }

        for (&handle, &id) in font_ids.iter() {
            // every size of a typeface shares its subset
            let mut used = UsedGlyphs::default();
            let mut typeface = None;
            for (font, render) in self.fonts.iter().zip(render_fonts.iter()) {
                if font.resolved.as_ref().map(|r| r.handle) != Some(handle) {
                    continue;
                }
                for (gid, ch) in render.used.iter() {
                    used.insert(gid, ch);
                }
                if typeface.is_none() {
                    typeface = render.typeface.clone();
                }
            }
            let typeface = typeface.ok_or_else(|| ResourceError::Required(format!("font resource #{}", handle.index())))?;
            self.resources.mark_referenced(handle);
            write_font(&mut writer, id, &typeface, &used)?;
        }

        let interpolate = self.exec.profile().get_bool("images.interpolated")?;
        for (&handle, &id) in image_ids.iter() {
            let resource = self
                .resources
                .get(handle)
                .ok_or_else(|| ResourceError::Image(format!("resource #{} is gone", handle.index())))?;
            let data = resource
                .as_image()
                .ok_or_else(|| ResourceError::Image(format!("resource #{} is not an image", handle.index())))?;
            self.resources.mark_referenced(handle);
            write_image(&mut writer, id, data, interpolate)?;
        }

        let mut intents: Vec<Object> = Vec::new();
        for profile in self.output_intents.iter() {
            let handle = self.profiles[profile.index()].handle;
            let id = *profile_ids.entry(handle).or_insert_with(|| writer.allocate_id());
            let condition = match self.resources.get(handle).map(|r| r.spec().clone()) {
                Some(ResourceSpec::Profile(ProfileSpec::Srgb)) => "sRGB",
                Some(ResourceSpec::Profile(ProfileSpec::Gray)) => "Gray",
                _ => "Custom",
            };
            intents.push(
                Dictionary::new()
                    .with("Type", Name::from("OutputIntent"))
                    .with("S", Name::from("GTS_PDFA1"))
                    .with("OutputConditionIdentifier", PdfString::text(condition))
                    .with("DestOutputProfile", id)
                    .into(),
            );
        }

        for (&handle, &id) in profile_ids.iter() {
            let resource = self
                .resources
                .get(handle)
                .ok_or_else(|| ResourceError::Profile(format!("resource #{} is gone", handle.index())))?;
            let profile = resource
                .as_profile()
                .ok_or_else(|| ResourceError::Profile(format!("resource #{} is not a profile", handle.index())))?;
            self.resources.mark_referenced(handle);
            let dict = Dictionary::new()
                .with("N", u32::from(profile.components()))
                .with("Alternate", Name::from(profile.alternate()));
            writer.commit(id, Stream::new(dict, profile.data().to_vec()))?;
        }

        for (index, font) in render_fonts.iter().enumerate() {
            if !fonts_shown.contains(&index) {
                self.exec.message(
                    codes::UNUSED_RESOURCE,
                    Severity::Info,
                    &format!("font {} is loaded but never used", font.label),
                );
            }
        }

        writer.commit(
            page_tree_id,
            Dictionary::new()
                .with("Type", Name::from("Pages"))
                .with("Kids", page_refs.clone())
                .with("Count", page_refs.len()),
        )?;

        let outlines_id = self.outline.write(&mut writer, &page_ids)?;

        let mut catalog = Dictionary::new()
            .with("Type", Name::from("Catalog"))
            .with("Pages", page_tree_id);
        if let Some(outlines_id) = outlines_id {
            catalog.set("Outlines", outlines_id);
        }
        for (option, key) in [("doc.page_layout", "PageLayout"), ("doc.page_mode", "PageMode")] {
            let value = self.exec.profile().get(option)?;
            if !value.is_empty() {
                catalog.set(key, Name::from(value));
            }
        }
        if !intents.is_empty() {
            catalog.set("OutputIntents", intents);
        }
        writer.commit(catalog_id, catalog)?;

        let info_id = writer.allocate_id();
        writer.commit(info_id, self.info.to_dictionary())?;

        let encrypt_id = match &self.security {
            Some(handler) => {
                let id = writer.allocate_id();
                writer.set_unencrypted(id);
                writer.commit(id, handler.dictionary())?;
                Some(id)
            }
            None => None,
        };

        writer.finalize(&Trailer {
            root: catalog_id,
            info: Some(info_id),
            encrypt: encrypt_id,
            file_id: self.file_id.to_vec(),
        })?;
        log::debug!(
            "finalized document: {} pages, {} objects, {} bytes",
            page_refs.len(),
            writer.committed_count(),
            writer.position()
        );
        Ok(writer.into_sink())
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        let handles = self
            .fonts
            .iter()
            .filter_map(|font| font.resolved.as_ref().map(|r| r.handle))
            .chain(self.images.iter().copied())
            .chain(self.profiles.iter().map(|p| p.handle));
        for handle in handles {
            self.resources.release(handle);
        }
    }
}
