use crate::attribute_set::{AttributeSet, Slot};
use crate::gateway::{Identity, PointLookupGateway};
use crate::schema::{ModelSchema, SchemaDeclaration};
use crate::PassiveError;
use crate::value::Value;
use std::sync::Arc;

/// Fetches absent attributes of one record on demand.
///
/// The identity is captured from the record the first time a lookup is needed and
/// reused afterwards, even if the key attributes of the record change later.
#[derive(Debug)]
pub struct PassiveAttributeLoader {
    schema: Arc<ModelSchema>,
    declaration: Arc<SchemaDeclaration>,
    identity: Option<Identity>,
}

impl PassiveAttributeLoader {
    pub fn new(schema: Arc<ModelSchema>, declaration: Arc<SchemaDeclaration>) -> Self {
        Self { schema, declaration, identity: None }
    }

    /// Returns the value of `name`, fetching and caching it when it is absent.
    ///
    /// Without `force` only declared passive attributes are loadable; anything else that is
    /// missing from the record is a projection mistake and fails with `NotLoadable`.
    pub fn load<G>(&mut self, attributes: &mut AttributeSet, gateway: &G, name: &str, force: bool) -> Result<Value, PassiveError>
    where
        G: PointLookupGateway + ?Sized,
    {
        if let Slot::Present(value) = attributes.get(name) {
            return Ok(value.clone());
        }
        if !force && !self.declaration.is_passive(name) {
            return Err(PassiveError::NotLoadable { model: self.schema.name().to_string(), attribute: name.to_string() });
        }
        self.capture_identity(attributes, name)?;
        let identity = self.identity.as_ref().ok_or_else(|| PassiveError::new("identity not captured"))?;
        crate::debug!("Loading {}.{} for {}", self.schema.table(), name, identity);
        let value = gateway.fetch_column(&self.schema, identity, name)?;
        attributes.fill(name, value.clone());
        Ok(value)
    }

    pub fn memoized_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    fn capture_identity(&mut self, attributes: &AttributeSet, name: &str) -> Result<(), PassiveError> {
        if self.identity.is_none() {
            let identity = Identity::capture(&self.schema, attributes).map_err(|key| PassiveError::IdentityUnresolved {
                model: self.schema.name().to_string(),
                attribute: name.to_string(),
                key,
            })?;
            self.identity = Some(identity);
        }
        Ok(())
    }
}
