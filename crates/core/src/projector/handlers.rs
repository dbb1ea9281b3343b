use modeldex_api::models::{ResourceDescriptor, is_remote_uri};

/// What a handler knows about the descriptor being projected.
pub struct HandlerContext<'a> {
    pub collection: &'a str,
    /// Directory holding the descriptor, relative to the asset root.
    pub base_path: &'a str,
    /// Public mount prefix without trailing slash, e.g. `/model`.
    pub public_prefix: &'a str,
}

impl HandlerContext<'_> {
    /// Already absolute, remote or served from the public root.
    pub fn is_externally_rooted(&self, reference: &str) -> bool {
        reference.starts_with('/')
            || is_remote_uri(reference)
            || (!self.public_prefix.is_empty()
                && reference.starts_with(&format!(
                    "{}/",
                    self.public_prefix.trim_start_matches('/')
                )))
    }
}

/// Structure-specific rewriting of texture, motion and expression paths.
pub trait DescriptorHandler: Send + Sync {
    fn id(&self) -> &'static str;

    fn rewrite(&self, descriptor: &mut ResourceDescriptor, ctx: &HandlerContext<'_>);
}

/// Manifest mirrors are served from deep inside the collection; root every
/// author-relative reference at the descriptor's public directory.
pub struct ManifestHandler;

impl DescriptorHandler for ManifestHandler {
    fn id(&self) -> &'static str {
        "manifest-handler"
    }

    fn rewrite(&self, descriptor: &mut ResourceDescriptor, ctx: &HandlerContext<'_>) {
        let base = ctx.base_path.trim_matches('/');
        descriptor.map_asset_references(|reference| {
            if ctx.is_externally_rooted(reference) {
                reference.to_string()
            } else if base.is_empty() {
                format!("{}/{}", ctx.public_prefix, reference)
            } else {
                format!("{}/{}/{}", ctx.public_prefix, base, reference)
            }
        });
    }
}

/// Collections checked out from a git host carry a branch suffix in their
/// directory name that references must not repeat.
#[derive(Default)]
pub struct MultiDirectoryHandler;

const BRANCH_SUFFIXES: [&str; 4] = ["-master", "-main", "-dev", "-develop"];

impl MultiDirectoryHandler {
    pub fn new() -> Self {
        Self
    }

    /// `collection` without a trailing branch suffix (case-insensitive).
    pub fn clean_name<'a>(&self, collection: &'a str) -> &'a str {
        BRANCH_SUFFIXES
            .iter()
            .find_map(|suffix| {
                let split = collection.len().checked_sub(suffix.len())?;
                let tail = collection.get(split..)?;
                tail.eq_ignore_ascii_case(suffix)
                    .then(|| &collection[..split])
            })
            .unwrap_or(collection)
    }
}

impl DescriptorHandler for MultiDirectoryHandler {
    fn id(&self) -> &'static str {
        "multi-directory-handler"
    }

    fn rewrite(&self, descriptor: &mut ResourceDescriptor, ctx: &HandlerContext<'_>) {
        let clean = self.clean_name(ctx.collection);
        if clean == ctx.collection {
            return;
        }
        descriptor.map_asset_references(|reference| {
            if reference.contains(ctx.collection) {
                reference.replacen(ctx.collection, clean, 1)
            } else {
                reference.to_string()
            }
        });
    }
}
