//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have no identity and are compared by their attribute values.
/// A discrepancy line or a match result is a value object; a shipment is an
/// entity.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct MissingItem {
///     item_id: ItemId,
///     amount: u64,
/// }
///
/// impl ValueObject for MissingItem {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
