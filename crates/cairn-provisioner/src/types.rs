//! Type mapping between JSON Schema and native IaC type systems

/// Maps JSON Schema `type` names to a backend's variable types and back
pub trait TypeMapper {
    /// Backend name, for messages
    fn backend(&self) -> &'static str;

    /// Native type for a schema type; `None` means the schema has no `type`
    fn native_type(&self, schema_type: Option<&str>) -> &'static str;

    /// Schema type for a native type; `None` means "leave untyped"
    fn schema_type(&self, native: &str) -> Option<&'static str>;
}

/// Terraform / OpenTofu type mapper
///
/// Nested object and array shapes are not modeled, both become `any`.
pub struct TerraformTypeMapper;

impl TypeMapper for TerraformTypeMapper {
    fn backend(&self) -> &'static str {
        "terraform"
    }

    fn native_type(&self, schema_type: Option<&str>) -> &'static str {
        match schema_type {
            Some("string") => "string",
            Some("number") | Some("integer") => "number",
            Some("boolean") => "bool",
            _ => "any",
        }
    }

    fn schema_type(&self, native: &str) -> Option<&'static str> {
        // `list(string)` and friends: only the constructor matters
        let constructor = native.split('(').next().unwrap_or(native).trim();
        match constructor {
            "string" => Some("string"),
            "number" => Some("number"),
            "bool" => Some("boolean"),
            "list" | "set" | "tuple" => Some("array"),
            "map" | "object" => Some("object"),
            _ => None,
        }
    }
}

/// Bicep type mapper
pub struct BicepTypeMapper;

impl TypeMapper for BicepTypeMapper {
    fn backend(&self) -> &'static str {
        "bicep"
    }

    fn native_type(&self, schema_type: Option<&str>) -> &'static str {
        match schema_type {
            Some("string") => "string",
            Some("integer") | Some("number") => "int",
            Some("boolean") => "bool",
            Some("array") => "array",
            _ => "object",
        }
    }

    fn schema_type(&self, native: &str) -> Option<&'static str> {
        match native {
            "string" => Some("string"),
            "int" => Some("integer"),
            "bool" => Some("boolean"),
            "object" => Some("object"),
            "array" => Some("array"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terraform_native_types() {
        let mapper = TerraformTypeMapper;

        assert_eq!(mapper.native_type(Some("string")), "string");
        assert_eq!(mapper.native_type(Some("integer")), "number");
        assert_eq!(mapper.native_type(Some("number")), "number");
        assert_eq!(mapper.native_type(Some("boolean")), "bool");
        assert_eq!(mapper.native_type(Some("object")), "any");
        assert_eq!(mapper.native_type(Some("array")), "any");
        assert_eq!(mapper.native_type(None), "any");
    }

    #[test]
    fn test_terraform_schema_types() {
        let mapper = TerraformTypeMapper;

        assert_eq!(mapper.schema_type("string"), Some("string"));
        assert_eq!(mapper.schema_type("bool"), Some("boolean"));
        assert_eq!(mapper.schema_type("list(string)"), Some("array"));
        assert_eq!(mapper.schema_type("set(number)"), Some("array"));
        assert_eq!(mapper.schema_type("map(string)"), Some("object"));
        assert_eq!(mapper.schema_type("object({ a = string })"), Some("object"));
        assert_eq!(mapper.schema_type("any"), None);
    }

    #[test]
    fn test_bicep_types() {
        let mapper = BicepTypeMapper;

        assert_eq!(mapper.native_type(Some("integer")), "int");
        assert_eq!(mapper.native_type(Some("boolean")), "bool");
        assert_eq!(mapper.native_type(None), "object");
        assert_eq!(mapper.schema_type("int"), Some("integer"));
        assert_eq!(mapper.schema_type("securestring"), None);
    }
}
