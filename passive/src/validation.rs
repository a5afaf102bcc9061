use crate::record::Record;
use crate::schema::SchemaDeclaration;
use crate::value::Value;
use crate::PassiveError;
use std::fmt;
use std::sync::Arc;

pub type Condition = Arc<dyn Fn(&Record) -> bool + Send + Sync>;
pub type CustomCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

#[derive(Clone)]
pub enum Check {
    Presence,
    Length { min: Option<usize>, max: Option<usize> },
    Custom(CustomCheck),
}

impl Check {
    fn run(&self, value: &Value) -> Result<(), String> {
        match self {
            Check::Presence if value.is_blank() => Err("can't be blank".to_string()),
            Check::Presence => Ok(()),
            Check::Length { min, max } => {
                let len = match value {
                    Value::Text(s) => s.chars().count(),
                    Value::Bytes(b) => b.len(),
                    Value::Null => 0,
                    _ => return Ok(()),
                };
                match (min, max) {
                    (Some(min), _) if len < *min => Err(format!("is too short (minimum is {} characters)", min)),
                    (_, Some(max)) if len > *max => Err(format!("is too long (maximum is {} characters)", max)),
                    _ => Ok(()),
                }
            }
            Check::Custom(check) => check(value),
        }
    }
}

/// A check over one or more attributes, applied only when all its conditions hold.
#[derive(Clone)]
pub struct Rule {
    attributes: Vec<String>,
    check: Check,
    conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(attributes: &[&str], check: Check) -> Self {
        Self { attributes: attributes.iter().map(|a| a.to_string()).collect(), check, conditions: Vec::new() }
    }

    pub fn presence(attributes: &[&str]) -> Self {
        Self::new(attributes, Check::Presence)
    }

    pub fn length(attributes: &[&str], min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(attributes, Check::Length { min, max })
    }

    pub fn custom<F>(attributes: &[&str], check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::new(attributes, Check::Custom(Arc::new(check)))
    }

    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(Arc::new(condition));
        self
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    fn applies(&self, record: &Record) -> bool {
        self.conditions.iter().all(|condition| condition(record))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("attributes", &self.attributes)
            .field("conditions", &self.conditions.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub attribute: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn on(&self, attribute: &str) -> Vec<&str> {
        self.errors.iter().filter(|e| e.attribute == attribute).map(|e| e.message.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| format!("{} {}", e.attribute, e.message)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Validation rules of one model.
///
/// A rule registered for exactly one passive attribute only runs while that attribute is
/// present on the record, unless the declaration turns `skip_validation_if_absent` off.
/// Rules over several attributes are kept as they are and read (and so load) every attribute.
pub struct Validations {
    declaration: Arc<SchemaDeclaration>,
    rules: Vec<Rule>,
}

impl Validations {
    pub fn new(declaration: Arc<SchemaDeclaration>) -> Self {
        Self { declaration, rules: Vec::new() }
    }

    pub fn validates(&mut self, mut rule: Rule) -> &mut Self {
        if let [attribute] = rule.attributes.as_slice() {
            if self.declaration.is_passive(attribute) {
                let skip = self.declaration.options().skip_validation_if_absent;
                let attribute = attribute.clone();
                rule.conditions.push(Arc::new(move |record: &Record| !skip || record.contains(&attribute)));
            }
        }
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn validate(&self, record: &mut Record) -> Result<(), PassiveError> {
        let mut errors = ValidationErrors::default();
        for rule in &self.rules {
            if !rule.applies(record) {
                continue;
            }
            for attribute in &rule.attributes {
                let value = record.read(attribute)?;
                if let Err(message) = rule.check.run(&value) {
                    errors.errors.push(FieldError { attribute: attribute.clone(), message });
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PassiveError::Invalid(errors))
        }
    }
}
