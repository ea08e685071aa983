use crate::shared::bbox::{BBox, Detection};

/// True when some phone's center lies strictly inside the person box.
pub fn phone_in_box(person: &BBox, phones: &[Detection]) -> bool {
    phones
        .iter()
        .any(|phone| person.contains_strictly(phone.bbox.center()))
}
