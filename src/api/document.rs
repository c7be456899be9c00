//! Document payload and wire envelope.

use serde::{Deserialize, Serialize};

/// A document to register with the CRPT API.
///
/// Immutable once constructed; optional fields are supplied up front via
/// [`DocumentOptions`]. Field declaration order pins the wire order, and
/// absent optional fields serialize as explicit `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// OMS (order management station) identifier
    pub oms_id: String,
    /// Country of origin code
    pub country: String,
    /// Product name
    pub product: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Optional serial number
    pub serial_number: Option<String>,
}

/// Optional document fields, enumerated in one place.
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    pub description: Option<String>,
    pub serial_number: Option<String>,
}

impl Document {
    /// Create a document with only the required fields.
    pub fn new(
        oms_id: impl Into<String>,
        country: impl Into<String>,
        product: impl Into<String>,
    ) -> Self {
        Self::with_options(oms_id, country, product, DocumentOptions::default())
    }

    /// Create a document with the required fields plus optional ones.
    pub fn with_options(
        oms_id: impl Into<String>,
        country: impl Into<String>,
        product: impl Into<String>,
        options: DocumentOptions,
    ) -> Self {
        Self {
            oms_id: oms_id.into(),
            country: country.into(),
            product: product.into(),
            description: options.description,
            serial_number: options.serial_number,
        }
    }
}

/// The wire envelope posted to the registration endpoint.
///
/// Exactly two top-level fields, in this order: the document object and the
/// detached signature string.
#[derive(Debug, Serialize)]
pub struct SubmissionRequest<'a> {
    pub document: &'a Document,
    pub signature: &'a str,
}
