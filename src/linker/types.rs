//! Type Resolver - flattens a model's fields across inheritance and imports

use super::imports::ImportResolver;
use crate::adapter::SourceConventions;
use crate::facts::SchemaField;
use crate::store::FactStore;
use std::collections::HashSet;

pub struct TypeResolver<'a> {
    store: &'a FactStore,
    imports: ImportResolver<'a>,
    conventions: &'a SourceConventions,
}

impl<'a> TypeResolver<'a> {
    pub fn new(store: &'a FactStore, conventions: &'a SourceConventions) -> Self {
        Self {
            store,
            imports: ImportResolver::new(store, conventions),
            conventions,
        }
    }

    /// All fields of `model` as seen from `file_key`, own fields first.
    ///
    /// Own fields shadow inherited ones of the same name. Unknown models and
    /// inheritance cycles yield what could be collected, never an error.
    pub fn resolve_fields(&self, file_key: &str, model: &str) -> Vec<SchemaField> {
        let mut visiting = HashSet::new();
        self.resolve_in(file_key, model, &mut visiting)
    }

    fn resolve_in(
        &self,
        file_key: &str,
        model: &str,
        visiting: &mut HashSet<(String, String)>,
    ) -> Vec<SchemaField> {
        let key = (file_key.to_string(), model.to_string());
        if !visiting.insert(key.clone()) {
            return Vec::new();
        }
        let fields = self.lookup(file_key, model, visiting);
        visiting.remove(&key);
        fields
    }

    fn lookup(
        &self,
        file_key: &str,
        model: &str,
        visiting: &mut HashSet<(String, String)>,
    ) -> Vec<SchemaField> {
        let Some(file) = self.store.get(file_key) else {
            return Vec::new();
        };

        if let Some(definition) = file.models.get(model) {
            let mut fields: Vec<SchemaField> = Vec::new();
            for field in &definition.fields {
                match fields.iter_mut().find(|f| f.name == field.name) {
                    Some(existing) => *existing = field.clone(),
                    None => fields.push(field.clone()),
                }
            }

            let model_bases = definition
                .base_class_names
                .iter()
                .filter(|base| self.conventions.is_model_base(base));
            for base in model_bases {
                for inherited in self.resolve_in(file_key, base, visiting) {
                    if !fields.iter().any(|f| f.name == inherited.name) {
                        fields.push(inherited);
                    }
                }
            }
            return fields;
        }

        let Some(qualified) = self.imports.qualify(file, model) else {
            return Vec::new();
        };
        match self.imports.resolve(&qualified) {
            Some(target) => {
                let symbol = target
                    .member
                    .unwrap_or_else(|| model.rsplit('.').next().unwrap_or(model).to_string());
                self.resolve_in(&target.file, &symbol, visiting)
            }
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PYTHON_CONVENTIONS;
    use crate::facts::{FileFacts, ModelFacts};

    fn model(fields: &[(&str, &str, bool)], bases: &[&str]) -> ModelFacts {
        ModelFacts {
            fields: fields
                .iter()
                .map(|(n, t, r)| SchemaField::new(*n, *t, *r))
                .collect(),
            base_class_names: bases.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn names(fields: &[SchemaField]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_inherited_fields_follow_own_fields() {
        let mut schemas = FileFacts::new("app/schemas.py");
        schemas.models.insert("UserBaseModel".into(), model(&[("email", "str", true), ("name", "str", true)], &["BaseModel"]));
        schemas.models.insert(
            "UserOutModel".into(),
            model(&[("id", "int", true), ("name", "Optional[str]", false)], &["UserBaseModel"]),
        );
        let store: FactStore = [schemas].into_iter().collect();
        let resolver = TypeResolver::new(&store, &PYTHON_CONVENTIONS);

        let fields = resolver.resolve_fields("app/schemas.py", "UserOutModel");
        assert_eq!(names(&fields), vec!["id", "name", "email"]);
        assert!(!fields[1].required);
    }

    #[test]
    fn test_imported_model() {
        let mut schemas = FileFacts::new("app/schemas/user.py");
        schemas.models.insert("UserCreate".into(), model(&[("email", "str", true)], &["BaseModel"]));
        let mut api = FileFacts::new("app/api/users.py");
        api.imports.insert("UserCreate".into(), "app.schemas.user.UserCreate".into());
        api.imports.insert("schemas".into(), "app.schemas".into());
        let store: FactStore = [schemas, api].into_iter().collect();
        let resolver = TypeResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(names(&resolver.resolve_fields("app/api/users.py", "UserCreate")), vec!["email"]);
        assert!(resolver.resolve_fields("app/api/users.py", "Missing").is_empty());
        assert!(resolver.resolve_fields("nowhere.py", "UserCreate").is_empty());
    }

    #[test]
    fn test_inheritance_cycle_terminates() {
        let mut file = FileFacts::new("cycle.py");
        file.models.insert("AModel".into(), model(&[("a", "int", true)], &["BModel"]));
        file.models.insert("BModel".into(), model(&[("b", "int", true)], &["AModel"]));
        let store: FactStore = [file].into_iter().collect();
        let resolver = TypeResolver::new(&store, &PYTHON_CONVENTIONS);

        assert_eq!(names(&resolver.resolve_fields("cycle.py", "AModel")), vec!["a", "b"]);
    }
}
