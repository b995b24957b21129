//! Link-time candidate discovery.
//!
//! Crates submit [`CandidateRegistration`]s with `inventory::submit!`, usually
//! through the `#[register]` attribute. [`discover`] gathers every submission
//! in the final binary into one candidate list for the registry builder.

use courier_core::TypeDescriptor;

/// A candidate submitted at link time.
pub struct CandidateRegistration {
    name: &'static str,
    contract: &'static str,
    build: fn() -> TypeDescriptor,
}

impl CandidateRegistration {
    /// Submission of the type named `name` for `contract`, described by `build`.
    pub const fn new(
        name: &'static str,
        contract: &'static str,
        build: fn() -> TypeDescriptor,
    ) -> Self {
        Self {
            name,
            contract,
            build,
        }
    }

    /// Name used to order submissions.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Contract the submission provides; orders submissions of one type.
    pub fn contract(&self) -> &'static str {
        self.contract
    }

    /// Builds the descriptor.
    pub fn descriptor(&self) -> TypeDescriptor {
        (self.build)()
    }
}

inventory::collect!(CandidateRegistration);

/// Every submitted candidate, ordered by type name.
///
/// Submissions for the same type are merged into one descriptor, so a type
/// registered once per contract still scans as a single candidate. When those
/// submissions carry different constructors, the one whose contract sorts
/// first is used. Ordering by name and then contract makes single-winner ties
/// and constructor choice the same on every run, whatever order the linker
/// used.
pub fn discover() -> Vec<TypeDescriptor> {
    let mut entries: Vec<&CandidateRegistration> =
        inventory::iter::<CandidateRegistration>.into_iter().collect();
    entries.sort_by_key(|entry| (entry.name, entry.contract));

    let mut merged: Vec<TypeDescriptor> = Vec::new();
    for entry in entries {
        let descriptor = entry.descriptor();
        match merged.iter_mut().find(|known| known.key() == descriptor.key()) {
            Some(known) => known.merge(descriptor),
            None => merged.push(descriptor),
        }
    }
    tracing::debug!(candidates = merged.len(), "discovered candidates");
    merged
}
