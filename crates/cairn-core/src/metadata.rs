//! Generated execution-context schema
//!
//! Every deployment receives an `md_metadata` object describing where and
//! how it runs. It is folded into the combined schema so that IaC steps
//! declare a variable for it like any other input.

use serde_json::json;

use crate::schema::SchemaNode;

/// Name of the generated metadata property
pub const METADATA_PROPERTY: &str = "md_metadata";

/// The fixed metadata schema contributed to every combined schema
pub fn metadata_schema() -> SchemaNode {
    SchemaNode::from(json!({
        "properties": {
            "md_metadata": {
                "title": "Deployment metadata",
                "type": "object",
                "required": [
                    "name_prefix",
                    "default_tags",
                    "deployment",
                    "observability"
                ],
                "properties": {
                    "name_prefix": {
                        "title": "Name prefix",
                        "type": "string",
                        "description": "Unique prefix for resources created by this deployment"
                    },
                    "default_tags": {
                        "title": "Default tags",
                        "type": "object",
                        "required": ["managed-by", "md-manifest", "md-package", "md-project", "md-target"],
                        "properties": {
                            "managed-by": {"type": "string"},
                            "md-manifest": {"type": "string"},
                            "md-package": {"type": "string"},
                            "md-project": {"type": "string"},
                            "md-target": {"type": "string"}
                        }
                    },
                    "deployment": {
                        "title": "Deployment",
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": {"type": "string"}
                        }
                    },
                    "observability": {
                        "title": "Observability",
                        "type": "object",
                        "required": ["alarm_webhook_url"],
                        "properties": {
                            "alarm_webhook_url": {
                                "type": "string",
                                "format": "uri"
                            }
                        }
                    },
                    "package": {
                        "title": "Package",
                        "type": "object",
                        "properties": {
                            "name": {"type": "string"},
                            "created_at": {"type": "string", "format": "date-time"},
                            "updated_at": {"type": "string", "format": "date-time"},
                            "deployment_id": {"type": "string"}
                        }
                    },
                    "target": {
                        "title": "Target",
                        "type": "object",
                        "properties": {
                            "contact_email": {"type": "string"}
                        }
                    },
                    "tag": {
                        "title": "Release tag",
                        "type": "string"
                    }
                }
            }
        },
        "required": ["md_metadata"]
    }))
}
