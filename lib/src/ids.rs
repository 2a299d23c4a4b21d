//! Deterministic ID allocation.
//!
//! Classes and properties live in disjoint ranges:
//! `class_base <= class ids < property_base <= property ids < instance_base`.
//! Within a range, IDs follow the case-insensitive order of local names, so the
//! same ontology always yields the same IDs. Adding an entity shifts the IDs of
//! every entity sorted after it in the same category.

use crate::model::{CompilationModel, Entity};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdRanges {
    pub class_base: u32,
    pub property_base: u32,
    pub instance_base: u32,
}

impl Default for IdRanges {
    fn default() -> Self {
        IdRanges {
            class_base: 1000,
            property_base: 5000,
            instance_base: 10000,
        }
    }
}

impl IdRanges {
    pub fn validate(&self) -> Result<(), String> {
        if self.class_base >= self.property_base {
            return Err(format!(
                "class_base ({}) must be below property_base ({})",
                self.class_base, self.property_base
            ));
        }
        if self.property_base >= self.instance_base {
            return Err(format!(
                "property_base ({}) must be below instance_base ({})",
                self.property_base, self.instance_base
            ));
        }
        Ok(())
    }

    pub fn is_class_id(&self, id: u32) -> bool {
        id >= self.class_base && id < self.property_base
    }

    pub fn is_property_id(&self, id: u32) -> bool {
        id >= self.property_base && id < self.instance_base
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("{count} {category} entities do not fit in id range [{base}, {limit})")]
    RangeOverflow {
        category: &'static str,
        count: usize,
        base: u32,
        limit: u32,
    },
}

/// Assigns `numeric_id` to every class and property of the model.
pub fn allocate_ids(model: &mut CompilationModel, ranges: &IdRanges) -> Result<(), AllocationError> {
    allocate_category(
        &mut model.classes,
        "class",
        ranges.class_base,
        ranges.property_base,
    )?;
    allocate_category(
        &mut model.properties,
        "property",
        ranges.property_base,
        ranges.instance_base,
    )?;
    debug!(
        "allocated {} class ids and {} property ids",
        model.classes.len(),
        model.properties.len()
    );
    Ok(())
}

fn allocate_category(
    entities: &mut BTreeMap<String, Entity>,
    category: &'static str,
    base: u32,
    limit: u32,
) -> Result<(), AllocationError> {
    let capacity = limit.saturating_sub(base) as usize;
    if entities.len() > capacity {
        return Err(AllocationError::RangeOverflow {
            category,
            count: entities.len(),
            base,
            limit,
        });
    }

    let mut order: Vec<(String, String)> = entities
        .iter()
        .map(|(key, entity)| (entity.local_name.to_lowercase(), key.clone()))
        .collect();
    order.sort();

    for (offset, (_, key)) in order.into_iter().enumerate() {
        if let Some(entity) = entities.get_mut(&key) {
            entity.numeric_id = Some(base + offset as u32);
        }
    }
    Ok(())
}
