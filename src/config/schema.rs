use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "exclude": { "type": "array", "items": { "type": "string" } },
            "scan": {
                "type": "object",
                "properties": {
                    "test_file_suffix": { "type": "string", "minLength": 1 },
                    "source_file_suffix": { "type": "string", "minLength": 1 },
                    "workers": { "type": "integer", "minimum": 1 },
                    "analyzer_timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "output": {
                "type": "object",
                "properties": {
                    "directory": { "type": "string" },
                    "format": { "type": "string", "enum": ["html", "json", "all"] },
                    "template": { "type": "string" }
                }
            },
            "analyzers": {
                "type": "object",
                "properties": {
                    "unit_test": { "$ref": "#/$defs/tool" },
                    "complexity": { "$ref": "#/$defs/tool" },
                    "simplification": { "$ref": "#/$defs/tool" },
                    "duplicates": { "$ref": "#/$defs/tool" },
                    "static_scan": { "$ref": "#/$defs/tool" },
                    "dependency_graph": { "$ref": "#/$defs/tool" },
                    "dead_code": { "$ref": "#/$defs/tool" },
                    "spelling": { "$ref": "#/$defs/tool" },
                    "import_closure": { "$ref": "#/$defs/tool" }
                },
                "additionalProperties": false
            }
        },
        "$defs": {
            "tool": {
                "type": "object",
                "properties": {
                    "enabled": { "type": "boolean" },
                    "command": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
                }
            }
        }
    })
});
