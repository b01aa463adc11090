//! Signature providers.

use crate::catalog::TypeCatalog;
use crate::signature::RawRegistration;

/// The front end as seen by the pipeline.
///
/// A provider exposes the registrations of one snapshot together with the
/// catalog of the types they mention.
pub trait SignatureProvider {
    /// Registrations in the order the front end found them.
    fn registrations(&self) -> &[RawRegistration];

    /// Types referenced by the registrations.
    fn catalog(&self) -> &TypeCatalog;
}
