//! PDF codec built on `lopdf`.
//!
//! Pages are copied by renumbering the source above the target's highest
//! object id so nothing collides. Its page objects are then hung under the
//! target's Pages root and the target's `Kids`/`Count` are patched. Only
//! objects reachable from the copied pages travel along, so the source's
//! catalog and outline stay behind.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use tracing::{debug, instrument};

use crate::codec::{Codec, LoadOptions};
use crate::config::{CompressionLevel, Config};
use crate::error::CodecError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// [`Codec`] implementation for PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfCodec {
    compression: CompressionLevel,
}

impl LopdfCodec {
    /// Create a codec with standard compression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec that applies `compression` on serialisation.
    pub fn with_compression(compression: CompressionLevel) -> Self {
        Self { compression }
    }

    /// Create a codec using the compression level of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_compression(config.compression)
    }

    /// Reference to the Pages root of `doc`.
    fn pages_root(doc: &Document) -> Result<ObjectId, CodecError> {
        doc.catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(|pages| pages.as_reference())
            .map_err(|e| CodecError::Copy(format!("Failed to get pages reference: {e}")))
    }

    /// Append page references to the Pages root of `doc` and patch `Count`.
    fn add_pages_to_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<(), CodecError> {
        let pages_id = Self::pages_root(doc)?;

        let dict = doc
            .get_dictionary_mut(pages_id)
            .map_err(|e| CodecError::Copy(format!("Failed to get pages object: {e}")))?;

        let kids = dict
            .get_mut(b"Kids")
            .and_then(|kids| kids.as_array_mut())
            .map_err(|_| CodecError::Copy("Pages dictionary missing Kids array".to_string()))?;

        kids.extend(page_ids.iter().map(|&id| Object::Reference(id)));

        let current_count = dict.get(b"Count").and_then(|c| c.as_i64()).unwrap_or(0);
        dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

        Ok(())
    }
}

impl Codec for LopdfCodec {
    type Document = Document;

    fn create_empty(&self) -> Result<Document, CodecError> {
        let mut doc = Document::with_version("1.5");

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => Object::Integer(0),
        });

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }

    #[instrument(skip_all, fields(bytes_len = bytes.len(), tolerant = options.tolerate_protection))]
    fn load(&self, bytes: &[u8], options: LoadOptions) -> Result<Document, CodecError> {
        let mut doc = Document::load_mem(bytes)?;

        if is_protected(&doc) {
            if !options.tolerate_protection {
                return Err(CodecError::Protected);
            }
            // Without a decryption state lopdf leaves the objects unparsed,
            // so there are no pages to extract.
            if doc.encryption_state.is_none() || Self::pages_root(&doc).is_err() {
                return Err(CodecError::Parse(
                    "encrypted document requires a password".to_string(),
                ));
            }
            doc.trailer.remove(b"Encrypt");
        }

        debug!(pages = doc.get_pages().len(), "PDF loaded from bytes");
        Ok(doc)
    }

    fn page_indices(&self, document: &Document) -> Vec<usize> {
        (0..document.get_pages().len()).collect()
    }

    fn copy_pages(
        &self,
        source: &mut Document,
        indices: &[usize],
        into: &mut Document,
    ) -> Result<usize, CodecError> {
        // Avoid object id collisions by renumbering the incoming document
        source.renumber_objects_with(into.max_id + 1);

        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let selected = indices
            .iter()
            .map(|&index| {
                source_pages.get(index).copied().ok_or_else(|| {
                    CodecError::Copy(format!(
                        "page index {index} out of range (0..{})",
                        source_pages.len()
                    ))
                })
            })
            .collect::<Result<Vec<ObjectId>, CodecError>>()?;

        let pages_root = Self::pages_root(into)?;

        // Insert every page first so references between pages resolve to the
        // copies instead of dragging the old page tree along.
        let mut copied = Vec::with_capacity(selected.len());
        for &page_id in &selected {
            let original = source
                .get_dictionary(page_id)
                .map_err(|e| CodecError::Copy(format!("Failed to get page: {e}")))?;

            let mut page = original.clone();
            for key in INHERITABLE_ATTRIBUTES {
                if page.get(key).is_err()
                    && let Some(value) = resolve_inherited(source, original, key)
                {
                    page.set(key, value.clone());
                }
            }
            page.set("Parent", Object::Reference(pages_root));

            let object = Object::Dictionary(page);
            into.objects.insert(page_id, object.clone());
            copied.push(object);
        }

        for object in &copied {
            copy_references(into, source, object);
        }

        into.max_id = into.max_id.max(source.max_id);
        Self::add_pages_to_tree(into, &selected)?;

        Ok(selected.len())
    }

    #[instrument(skip_all)]
    fn serialize(&self, document: &mut Document) -> Result<Vec<u8>, CodecError> {
        match self.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => {
                document.compress();
            }
            CompressionLevel::Maximum => {
                document.prune_objects();
                document.compress();
            }
        }

        // Always renumber for consistency
        document.renumber_objects();

        let mut buffer = Vec::new();
        document
            .save_to(&mut buffer)
            .map_err(|e| CodecError::Serialize(e.to_string()))?;

        debug!(output_bytes = buffer.len(), "PDF serialized");
        Ok(buffer)
    }
}

/// Whether the trailer still announces an encryption dictionary.
fn is_protected(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// Look up `key` on the ancestors of `page`, nearest first.
fn resolve_inherited<'a>(doc: &'a Document, page: &Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut parent = page.get(b"Parent").and_then(|p| p.as_reference()).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        parent = node.get(b"Parent").and_then(|p| p.as_reference()).ok();
    }

    None
}

/// Copy every object reachable from `obj` that `target` does not hold yet.
fn copy_references(target: &mut Document, source: &Document, obj: &Object) {
    match obj {
        Object::Reference(ref_id) => {
            if !target.objects.contains_key(ref_id)
                && let Ok(referenced_obj) = source.get_object(*ref_id)
            {
                target.objects.insert(*ref_id, referenced_obj.clone());
                copy_references(target, source, referenced_obj);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                copy_references(target, source, value);
            }
        }
        Object::Array(arr) => {
            for item in arr {
                copy_references(target, source, item);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                copy_references(target, source, value);
            }
        }
        _ => {}
    }
}
