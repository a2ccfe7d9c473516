//! Partition components into subword groups.

use tracing::debug;

use crate::contour::ComponentId;
use crate::diacritics::SecondaryToPrimary;
use crate::error::SegmentError;

/// One primary component plus the diacritics bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubwordGroup {
    pub primary: ComponentId,
    /// Bound secondaries in ascending id order.
    pub secondaries: Vec<ComponentId>,
}

impl SubwordGroup {
    pub fn singleton(primary: ComponentId) -> Self {
        SubwordGroup {
            primary,
            secondaries: Vec::new(),
        }
    }

    /// Primary first, then secondaries.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        std::iter::once(self.primary).chain(self.secondaries.iter().copied())
    }

    pub fn len(&self) -> usize {
        1 + self.secondaries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Build one group per primary component, in ascending primary id.
///
/// With `binding == None` diacritics are suppressed: only primaries are
/// grouped and secondary components appear nowhere in the output. Otherwise
/// the binding must cover exactly the secondary-flagged components and point
/// only at primaries.
pub fn assemble(
    is_primary: &[bool],
    binding: Option<&SecondaryToPrimary>,
) -> Result<Vec<SubwordGroup>, SegmentError> {
    let Some(binding) = binding else {
        let groups: Vec<SubwordGroup> = is_primary
            .iter()
            .enumerate()
            .filter(|(_, p)| **p)
            .map(|(i, _)| SubwordGroup::singleton(ComponentId(i)))
            .collect();
        debug!(groups = groups.len(), dropped = is_primary.len() - groups.len(), "assemble without diacritics");
        return Ok(groups);
    };

    for (secondary, _) in binding.iter() {
        match is_primary.get(secondary.0) {
            None => {
                return Err(SegmentError::invariant(format!(
                    "binding references unknown secondary component {}",
                    secondary
                )))
            }
            Some(true) => {
                return Err(SegmentError::invariant(format!(
                    "binding maps primary-flagged component {} as a diacritic",
                    secondary
                )))
            }
            Some(false) => {}
        }
    }
    if let Some(unbound) = (0..is_primary.len())
        .map(ComponentId)
        .find(|id| !is_primary[id.0] && !binding.contains(*id))
    {
        return Err(SegmentError::invariant(format!(
            "secondary component {} is not bound to any primary",
            unbound
        )));
    }

    // Group slot per component id; only primaries get one.
    let mut slot: Vec<Option<usize>> = vec![None; is_primary.len()];
    let mut groups: Vec<SubwordGroup> = Vec::new();
    for id in (0..is_primary.len()).map(ComponentId) {
        if !binding.contains(id) {
            slot[id.0] = Some(groups.len());
            groups.push(SubwordGroup::singleton(id));
        }
    }

    for (secondary, primary) in binding.iter() {
        let index = slot.get(primary.0).copied().flatten().ok_or_else(|| {
            SegmentError::invariant(format!(
                "diacritic {} bound to unknown primary component {}",
                secondary, primary
            ))
        })?;
        groups[index].secondaries.push(secondary);
    }

    debug!(groups = groups.len(), diacritics = binding.len(), "assemble");
    Ok(groups)
}
