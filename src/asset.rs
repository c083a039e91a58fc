//! Read, modify and write the sidecar file of one image.
//!
//! An [`Asset`] owns a [`Document`] together with the location it was
//! loaded from (or will be saved to) and a name index over its annotations.
//! Nothing touches storage except [`Asset::load`] and [`Asset::save`].

use std::collections::HashMap;
use std::ops::Index;
use std::path::{Path, PathBuf};

use crate::env::Environment;
use crate::error::{AnnotaError, CodecError, ValidationError};
use crate::schema::codec;
use crate::schema::{Annotation, AnnotationAttributes, Document, ImageFile, Meta};

/// Extension of sidecar files.
pub const SIDECAR_EXTENSION: &str = "meta";

/// Sidecar location for a primary resource: `level1.png` -> `level1.meta`.
pub fn sidecar_path(path: &Path) -> PathBuf {
    path.with_extension(SIDECAR_EXTENSION)
}

/// An image asset and all of its annotations.
#[derive(Debug)]
pub struct Asset {
    document: Document,
    path: Option<PathBuf>,
    /// Annotation name -> position in `document.annotations`.
    index: HashMap<String, usize>,
    env: Environment,
}

impl Asset {
    /// Loads the sidecar of `image_path` from the local filesystem.
    ///
    /// # Errors
    /// [`AnnotaError::NotFound`] if there is no sidecar,
    /// [`AnnotaError::InvalidFile`] if its content does not decode.
    pub fn load(image_path: impl AsRef<Path>) -> Result<Self, AnnotaError> {
        Self::load_with(image_path, Environment::default())
    }

    /// Like [`Asset::load`], using the given collaborators.
    pub fn load_with(image_path: impl AsRef<Path>, env: Environment) -> Result<Self, AnnotaError> {
        let meta_path = sidecar_path(image_path.as_ref());

        if !env.storage.exists(&meta_path) {
            return Err(AnnotaError::NotFound { path: meta_path });
        }

        let text = env
            .storage
            .read_text(&meta_path)
            .map_err(|source| AnnotaError::Io {
                path: meta_path.clone(),
                source,
            })?;
        let origin = meta_path.display().to_string();
        let document = decode_unique(&text, &origin, &env).map_err(|source| {
            AnnotaError::InvalidFile {
                path: meta_path.clone(),
                source,
            }
        })?;

        tracing::debug!(
            path = %meta_path.display(),
            annotations = document.annotations.len(),
            "loaded sidecar"
        );
        Ok(Self::from_checked(document, Some(meta_path), env))
    }

    /// Decodes an asset from sidecar text, optionally bound to `source_path`.
    ///
    /// `source_path` is used as-is (it is not mapped to a sidecar path).
    pub fn from_text(text: &str, source_path: Option<PathBuf>) -> Result<Self, AnnotaError> {
        Self::from_text_with(text, source_path, Environment::default())
    }

    /// Like [`Asset::from_text`], using the given collaborators.
    pub fn from_text_with(
        text: &str,
        source_path: Option<PathBuf>,
        env: Environment,
    ) -> Result<Self, AnnotaError> {
        let origin = source_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<string>".to_string());
        let document =
            decode_unique(text, &origin, &env).map_err(|source| AnnotaError::InvalidFile {
                path: PathBuf::from(&origin),
                source,
            })?;
        Ok(Self::from_checked(document, source_path, env))
    }

    /// Creates an empty, unsaved asset for a new image.
    ///
    /// # Errors
    /// [`AnnotaError::InvalidDimensions`] if `width` or `height` is zero.
    pub fn create(
        image_path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> Result<Self, AnnotaError> {
        Self::create_with(image_path, width, height, Environment::default())
    }

    /// Like [`Asset::create`], using the given collaborators.
    pub fn create_with(
        image_path: impl AsRef<Path>,
        width: u32,
        height: u32,
        env: Environment,
    ) -> Result<Self, AnnotaError> {
        if width == 0 || height == 0 {
            return Err(AnnotaError::InvalidDimensions { width, height });
        }

        let meta = Meta::new(&env.provenance, env.clock.now());
        let document = Document::image(meta, ImageFile::new(width, height));
        Ok(Self {
            document,
            path: Some(sidecar_path(image_path.as_ref())),
            index: HashMap::new(),
            env,
        })
    }

    /// Wraps an existing document, bound to `path` if given.
    ///
    /// # Errors
    /// A [`ValidationError`] naming the first annotation that repeats an
    /// earlier name.
    pub fn from_document(
        document: Document,
        path: Option<PathBuf>,
        env: Environment,
    ) -> Result<Self, ValidationError> {
        let index = build_index(&document.annotations)?;
        Ok(Self {
            document,
            path,
            index,
            env,
        })
    }

    /// Only for documents that already went through [`decode_unique`].
    fn from_checked(document: Document, path: Option<PathBuf>, env: Environment) -> Self {
        let index = document
            .annotations
            .iter()
            .enumerate()
            .map(|(pos, ann)| (ann.name.clone(), pos))
            .collect();
        Self {
            document,
            path,
            index,
            env,
        }
    }

    /// Writes the sidecar, refreshing `meta.updated_at`.
    ///
    /// The target is `path` if given, otherwise the bound location. The
    /// asset stays bound to its original location either way.
    pub fn save(&mut self, path: Option<&Path>) -> Result<(), AnnotaError> {
        let target = match path.or(self.path.as_deref()) {
            Some(target) => target.to_path_buf(),
            None => return Err(AnnotaError::NoTarget),
        };

        let text = self.to_text(true, 2)?;
        self.env
            .storage
            .write_text(&target, &text)
            .map_err(|source| AnnotaError::Io {
                path: target.clone(),
                source,
            })?;

        tracing::debug!(path = %target.display(), "saved sidecar");
        Ok(())
    }

    /// Encodes the document, optionally refreshing `meta.updated_at` first.
    pub fn to_text(&mut self, update_timestamp: bool, indent: usize) -> Result<String, AnnotaError> {
        if update_timestamp {
            self.document.meta.updated_at = self.env.clock.now();
        }
        codec::encode(&self.document, indent).map_err(AnnotaError::Encode)
    }

    /// Bound sidecar location, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn meta(&self) -> &Meta {
        &self.document.meta
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.document.annotations
    }

    /// `(width, height)` of the associated image.
    pub fn image_size(&self) -> (u32, u32) {
        (self.document.file.width, self.document.file.height)
    }

    pub fn get_annotation(&self, name: &str) -> Option<&Annotation> {
        self.index
            .get(name)
            .map(|&pos| &self.document.annotations[pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.document.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.annotations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.document.annotations.iter()
    }

    /// Builds an annotation whose UUID comes from this asset's generator.
    ///
    /// The annotation is not added.
    pub fn new_annotation(
        &self,
        name: impl Into<String>,
        display_name: impl Into<String>,
        attributes: AnnotationAttributes,
    ) -> Annotation {
        Annotation::with_ids(self.env.ids.as_ref(), name, display_name, attributes)
    }

    /// Appends an annotation.
    ///
    /// With `overwrite`, an existing annotation of the same name is removed
    /// first and the new one goes to the end of the sequence.
    ///
    /// # Errors
    /// [`AnnotaError::DuplicateName`] if the name exists and `overwrite` is
    /// false. The asset is left unchanged.
    pub fn add_annotation(
        &mut self,
        annotation: Annotation,
        overwrite: bool,
    ) -> Result<(), AnnotaError> {
        if self.contains(&annotation.name) {
            if !overwrite {
                return Err(AnnotaError::DuplicateName {
                    name: annotation.name,
                });
            }
            self.remove_annotation(&annotation.name);
        }

        self.index
            .insert(annotation.name.clone(), self.document.annotations.len());
        self.document.annotations.push(annotation);
        Ok(())
    }

    /// Removes and returns the annotation called `name`, if present.
    pub fn remove_annotation(&mut self, name: &str) -> Option<Annotation> {
        let pos = self.index.remove(name)?;
        let removed = self.document.annotations.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }
}

fn build_index(annotations: &[Annotation]) -> Result<HashMap<String, usize>, ValidationError> {
    let mut index = HashMap::with_capacity(annotations.len());
    for (pos, ann) in annotations.iter().enumerate() {
        if index.insert(ann.name.clone(), pos).is_some() {
            return Err(ValidationError::new(
                format!("annotations[{}].name", pos),
                format!("duplicate annotation name {:?}", ann.name),
            ));
        }
    }
    Ok(index)
}

/// Decodes sidecar text and checks that annotation names are unique.
fn decode_unique(text: &str, origin: &str, env: &Environment) -> Result<Document, CodecError> {
    let document = codec::decode_str_with_ids(text, origin, env.ids.as_ref())?;
    build_index(&document.annotations)?;
    Ok(document)
}

impl Index<&str> for Asset {
    type Output = Annotation;

    /// # Panics
    /// If no annotation is called `name`.
    fn index(&self, name: &str) -> &Annotation {
        match self.get_annotation(name) {
            Some(annotation) => annotation,
            None => panic!("Annotation with name '{}' does not exist", name),
        }
    }
}

impl<'a> IntoIterator for &'a Asset {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
