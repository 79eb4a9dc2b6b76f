//! Shared resources (typefaces, colour profiles, images) deduplicated by their spec.
//!
//! A [ResourceContext] owns every resource it constructs; documents hold
//! [ResourceHandle]s into it. The same context can serve several documents, also from
//! different threads.

pub mod fontspec;
pub mod icc;
pub mod image;
pub mod subset;
pub mod typeman;

use self::{
    fontspec::{FontSource, FontSpec, TypefaceSpec, STANDARD_FAMILIES},
    icc::{ColorProfile, ProfileSpec},
    image::{ImageData, ImageSpec},
    typeman::{FontLoader, ResolvedFont, TypeResolver, Typeface},
};
use crate::{config::ExecContext, error::ResourceError};
use id_arena::{Arena, Id};
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

/// Structural identity of a resource; equal specs share one resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceSpec {
    Typeface(TypefaceSpec),
    Profile(ProfileSpec),
    Image(ImageSpec),
}

impl std::fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceSpec::Typeface(spec) => {
                write!(f, "typeface {}", spec.source)?;
                if spec.bold {
                    f.write_str(" bold")?;
                }
                if spec.italic {
                    f.write_str(" italic")?;
                }
                Ok(())
            }
            ResourceSpec::Profile(ProfileSpec::Srgb) => f.write_str("profile sRGB"),
            ResourceSpec::Profile(ProfileSpec::Gray) => f.write_str("profile Gray"),
            ResourceSpec::Profile(ProfileSpec::Bytes(bytes)) => write!(f, "profile <{} bytes>", bytes.len()),
            ResourceSpec::Profile(ProfileSpec::File(path)) => write!(f, "profile {}", path.display()),
            ResourceSpec::Image(spec) => match &spec.source {
                self::image::ImageSource::File(path) => write!(f, "image {}", path.display()),
                self::image::ImageSource::Bytes(bytes) => write!(f, "image <{} bytes>", bytes.len()),
            },
        }
    }
}

#[derive(Debug)]
pub enum Backing {
    Typeface(Arc<Typeface>),
    Profile(ColorProfile),
    Image(ImageData),
}

#[derive(Debug)]
pub struct Resource {
    spec: ResourceSpec,
    backing: Backing,
    materialized: AtomicBool,
}

impl Resource {
    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    /// Whether any document has placed this resource in emitted content
    pub fn is_materialized(&self) -> bool {
        self.materialized.load(Ordering::Acquire)
    }

    pub fn as_typeface(&self) -> Option<&Arc<Typeface>> {
        match &self.backing {
            Backing::Typeface(typeface) => Some(typeface),
            _ => None,
        }
    }

    pub fn as_profile(&self) -> Option<&ColorProfile> {
        match &self.backing {
            Backing::Profile(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match &self.backing {
            Backing::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Stable key of a resource inside its context
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(Id<Arc<Resource>>);

impl ResourceHandle {
    pub fn index(&self) -> usize {
        self.0.index()
    }
}

#[derive(Default)]
struct Registry {
    arena: Arena<Arc<Resource>>,
    index: HashMap<ResourceSpec, Id<Arc<Resource>>>,
    counts: HashMap<Id<Arc<Resource>>, usize>,
}

pub struct ResourceContext {
    registry: Mutex<Registry>,
    typeman: TypeResolver,
}

static SHARED: Lazy<Arc<ResourceContext>> = Lazy::new(|| Arc::new(ResourceContext::with_defaults()));

impl Default for ResourceContext {
    fn default() -> Self {
        ResourceContext::new()
    }
}

impl ResourceContext {
    /// An empty context using the default font loader
    pub fn new() -> ResourceContext {
        ResourceContext::with_type_resolver(TypeResolver::default())
    }

    pub fn with_loader(loader: Box<dyn FontLoader>) -> ResourceContext {
        ResourceContext::with_type_resolver(TypeResolver::new(loader))
    }

    fn with_type_resolver(typeman: TypeResolver) -> ResourceContext {
        ResourceContext {
            registry: Mutex::new(Registry::default()),
            typeman,
        }
    }

    /// A context seeded with the standard 14 typefaces and the built-in sRGB and Gray
    /// profiles. Seeded resources start with no references.
    pub fn with_defaults() -> ResourceContext {
        let ctx = ResourceContext::new();
        let mut specs: Vec<ResourceSpec> = Vec::new();
        for family in STANDARD_FAMILIES {
            let styles: &[(bool, bool)] = match family {
                "Symbol" | "ZapfDingbats" => &[(false, false)],
                _ => &[(false, false), (true, false), (false, true), (true, true)],
            };
            for &(bold, italic) in styles {
                specs.push(ResourceSpec::Typeface(TypefaceSpec {
                    source: FontSource::Standard(family.to_string()),
                    bold,
                    italic,
                }));
            }
        }
        specs.push(ResourceSpec::Profile(ProfileSpec::Srgb));
        specs.push(ResourceSpec::Profile(ProfileSpec::Gray));

        {
            let mut registry = ctx.lock();
            for spec in specs {
                match ctx.construct(&spec) {
                    Ok(backing) => {
                        let id = registry.arena.alloc(Arc::new(Resource {
                            spec: spec.clone(),
                            backing,
                            materialized: AtomicBool::new(false),
                        }));
                        registry.index.insert(spec, id);
                        registry.counts.insert(id, 0);
                    }
                    Err(e) => log::warn!("cannot seed built-in {spec}: {e}"),
                }
            }
        }
        ctx
    }

    /// The process-wide context shared by documents that are not given their own
    pub fn shared_default() -> Arc<ResourceContext> {
        SHARED.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // the registry stays consistent across a panic: nothing is half inserted
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn construct(&self, spec: &ResourceSpec) -> Result<Backing, ResourceError> {
        match spec {
            ResourceSpec::Typeface(spec) => self.typeman.load(spec).map(|t| Backing::Typeface(Arc::new(t))),
            ResourceSpec::Profile(spec) => ColorProfile::load(spec).map(Backing::Profile),
            ResourceSpec::Image(spec) => ImageData::load(spec).map(Backing::Image),
        }
    }

    /// Find the resource for a spec, constructing it on first use. Each call holds one
    /// more reference on the resource, see [ResourceContext::release].
    pub fn get_or_create(&self, spec: &ResourceSpec) -> Result<ResourceHandle, ResourceError> {
        let mut registry = self.lock();
        let existing = registry.index.get(spec).copied();
        if let Some(id) = existing {
            *registry.counts.entry(id).or_insert(0) += 1;
            log::trace!("resource {} reused for {spec}", id.index());
            return Ok(ResourceHandle(id));
        }

        // constructed under the lock so concurrent first uses build it once
        let backing = self.construct(spec)?;
        let id = registry.arena.alloc(Arc::new(Resource {
            spec: spec.clone(),
            backing,
            materialized: AtomicBool::new(false),
        }));
        registry.index.insert(spec.clone(), id);
        registry.counts.insert(id, 1);
        log::debug!("resource {} constructed for {spec}", id.index());
        Ok(ResourceHandle(id))
    }

    pub fn get(&self, handle: ResourceHandle) -> Option<Arc<Resource>> {
        self.lock().arena.get(handle.0).cloned()
    }

    /// Drop one reference. The resource itself lives as long as the context.
    pub fn release(&self, handle: ResourceHandle) {
        let mut registry = self.lock();
        if let Some(count) = registry.counts.get_mut(&handle.0) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn reference_count(&self, handle: ResourceHandle) -> usize {
        self.lock().counts.get(&handle.0).copied().unwrap_or(0)
    }

    /// Record that a document placed the resource in its content. Returns `true` the
    /// first time this happens for the resource.
    pub fn mark_referenced(&self, handle: ResourceHandle) -> bool {
        match self.get(handle) {
            Some(resource) => !resource.materialized.swap(true, Ordering::AcqRel),
            None => false,
        }
    }

    pub fn is_materialized(&self, handle: ResourceHandle) -> bool {
        self.get(handle).map(|r| r.is_materialized()).unwrap_or(false)
    }

    /// Number of distinct resources held
    pub fn len(&self) -> usize {
        self.lock().arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_resolver(&self) -> &TypeResolver {
        &self.typeman
    }

    pub fn resolve_font(&self, spec: &FontSpec, exec: &ExecContext) -> Result<ResolvedFont, ResourceError> {
        self.typeman.resolve(self, spec, exec)
    }

    pub fn typeface(&self, handle: ResourceHandle) -> Option<Arc<Typeface>> {
        self.get(handle)?.as_typeface().cloned()
    }
}
