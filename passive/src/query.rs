use crate::gateway::{not_found, Identity, PointLookupGateway, RowSource};
use crate::projection::{default_projection, Projection};
use crate::record::Record;
use crate::schema::{ModelBinding, ModelType, SchemaRegistry};
use crate::PassiveError;
use std::sync::Arc;

/// Builds the projection for one model and materializes the rows it returns.
///
/// The projection is settled the first time it is needed and reused afterwards, so loading
/// the same query again never narrows it twice.
#[derive(Debug, Clone)]
pub struct Query {
    binding: ModelBinding,
    selected: Vec<String>,
    projection: Option<Projection>,
}

impl Query {
    pub fn new(binding: ModelBinding) -> Self {
        Self { binding, selected: Vec::new(), projection: None }
    }

    pub fn of<T: ModelType>(registry: &SchemaRegistry) -> Result<Self, PassiveError> {
        Ok(Self::new(registry.binding_for::<T>()?))
    }

    /// Explicit column list, taken as is even when it names passive attributes.
    pub fn select(mut self, columns: &[&str]) -> Result<Self, PassiveError> {
        for column in columns {
            self.binding.schema.ensure_attribute(column)?;
        }
        self.selected = columns.iter().map(|c| c.to_string()).collect();
        self.projection = None;
        Ok(self)
    }

    pub fn projection(&mut self) -> &Projection {
        let binding = &self.binding;
        let selected = &self.selected;
        self.projection
            .get_or_insert_with(|| default_projection(&binding.schema, &binding.declaration, selected))
    }

    pub fn is_finalized(&self) -> bool {
        self.projection.is_some()
    }

    pub fn load(&mut self, source: &dyn RowSource, gateway: Arc<dyn PointLookupGateway>) -> Result<Vec<Record>, PassiveError> {
        let projection = self.projection().clone();
        let rows = source.select(&self.binding.schema, &projection)?;
        crate::debug!("Loaded {} {} rows with {:?}", rows.len(), self.binding.schema.name(), projection);
        Ok(rows
            .into_iter()
            .map(|row| Record::materialize(self.binding.clone(), gateway.clone(), row))
            .collect())
    }

    pub fn find(&mut self, identity: &Identity, source: &dyn RowSource, gateway: Arc<dyn PointLookupGateway>) -> Result<Record, PassiveError> {
        let projection = self.projection().clone();
        let row = source
            .find(&self.binding.schema, identity, &projection)?
            .ok_or_else(|| not_found(&self.binding.schema, identity))?;
        Ok(Record::materialize(self.binding.clone(), gateway, row))
    }
}
