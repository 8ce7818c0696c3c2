//! Sorting and overlap resolution for positional annotations.

use std::cmp::{Ordering, Reverse};

use super::types::{EntityKind, EntityPayload, TextEntities, TextEntity};
use crate::error::EntityError;

/// Merge entities into one sequence ordered by `start_index` with overlaps
/// resolved.
///
/// Entities are sorted by start, then kind precedence
/// (hashtag < mention < url < media), then longest range first. Walking the
/// sorted list, an entity that overlaps the last emitted one is:
/// - folded into it when both are media and `merge_multiple_photos` is set;
///   the emitted range grows to the union
/// - emitted unchanged when both are media and merging is off
/// - dropped otherwise
///
/// The input is not modified.
///
/// # Errors
///
/// Returns [`EntityError::InvalidSpan`] for any entity whose range is empty
/// or inverted.
///
/// # Example
///
/// ```
/// use birdwire::entities::{coalesce, TextEntity};
///
/// let entities = [
///     TextEntity::url(10, 30, "https://t.co/x"),
///     TextEntity::hashtag(0, 5, "rust"),
///     TextEntity::mention(12, 20, "ferris"),
/// ];
/// let merged = coalesce(&entities, false)?;
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged[0].start_index, 0);
/// # Ok::<(), birdwire::error::EntityError>(())
/// ```
pub fn coalesce(
    entities: &[TextEntity],
    merge_multiple_photos: bool,
) -> Result<Vec<TextEntity>, EntityError> {
    if let Some(bad) = entities.iter().find(|e| e.start_index >= e.end_index) {
        return Err(EntityError::InvalidSpan {
            kind: bad.kind().to_string(),
            start: bad.start_index,
            end: bad.end_index,
        });
    }

    let mut sorted: Vec<&TextEntity> = entities.iter().collect();
    sorted.sort_by(|a, b| precedence(a, b));

    let mut out: Vec<TextEntity> = Vec::with_capacity(sorted.len());
    for entity in sorted {
        let Some(last) = out.last_mut() else {
            out.push(entity.clone());
            continue;
        };
        if !last.overlaps(entity) {
            out.push(entity.clone());
            continue;
        }

        let both_media = last.kind() == EntityKind::Media && entity.kind() == EntityKind::Media;
        if both_media && merge_multiple_photos {
            if let EntityPayload::Media { photos } = &mut last.payload {
                photos.extend(entity.photos().iter().cloned());
            }
            last.end_index = last.end_index.max(entity.end_index);
        } else if both_media {
            out.push(entity.clone());
        } else {
            tracing::debug!(
                kind = %entity.kind(),
                start = entity.start_index,
                end = entity.end_index,
                kept_kind = %last.kind(),
                kept_start = last.start_index,
                "Dropping overlapping entity"
            );
        }
    }

    Ok(out)
}

fn precedence(a: &TextEntity, b: &TextEntity) -> Ordering {
    let key = |e: &TextEntity| (e.start_index, e.kind(), Reverse(e.end_index));
    key(a).cmp(&key(b))
}

impl TextEntities {
    /// Flatten every list and [`coalesce`] the result.
    ///
    /// # Errors
    ///
    /// See [`coalesce`].
    pub fn coalesce(&self, merge_multiple_photos: bool) -> Result<Vec<TextEntity>, EntityError> {
        coalesce(&self.to_text_entities(), merge_multiple_photos)
    }
}
