//! Tool capabilities - a definition bound to its handler.

use std::future::Future;
use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use rmcp::{
    handler::server::tool::cached_schema_for_type,
    model::{Content, JsonObject},
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::definition::{ToolDefinition, ToolHints};
use super::error::{SchemaError, ValidationError};
use super::schema::ROOT_PATH;

/// What a handler produces: content blocks, or a failure of any kind.
pub type ToolOutcome = anyhow::Result<Vec<Content>>;

/// A pending handler invocation.
pub type ToolFuture = BoxFuture<'static, ToolOutcome>;

/// Decodes validated arguments and starts the handler.
type Binder = dyn Fn(JsonObject) -> Result<ToolFuture, ValidationError> + Send + Sync;

/// A tool definition together with the handler that executes it.
///
/// Cloning is cheap; the definition and handler are shared.
#[derive(Clone)]
pub struct ToolCapability {
    definition: Arc<ToolDefinition>,
    binder: Arc<Binder>,
}

impl ToolCapability {
    /// Bind a handler that accepts the raw argument object.
    ///
    /// The handler only ever sees arguments that passed validation against
    /// `definition`'s input schema.
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(JsonObject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutcome> + Send + 'static,
    {
        Self {
            definition: Arc::new(definition),
            binder: Arc::new(move |args| Ok(handler(args).boxed())),
        }
    }

    /// Bind a handler taking a typed parameter struct.
    ///
    /// The input schema is derived from `P`, so the schema and the shape the
    /// handler accepts cannot drift apart. Parameter types that do not
    /// describe an object are rejected here, at registration time.
    pub fn typed<P, F, Fut>(
        name: &str,
        description: &str,
        hints: ToolHints,
        handler: F,
    ) -> Result<Self, SchemaError>
    where
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutcome> + Send + 'static,
    {
        let definition =
            ToolDefinition::new(name, description, cached_schema_for_type::<P>(), hints)?;

        let binder = move |args: JsonObject| {
            let params: P = serde_json::from_value(serde_json::Value::Object(args))
                .map_err(|e| ValidationError::new(ROOT_PATH, e.to_string()))?;
            Ok(handler(params).boxed())
        };

        Ok(Self {
            definition: Arc::new(definition),
            binder: Arc::new(binder),
        })
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Decode validated arguments and start the handler.
    pub(crate) fn bind(&self, arguments: JsonObject) -> Result<ToolFuture, ValidationError> {
        (self.binder)(arguments)
    }
}

impl std::fmt::Debug for ToolCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCapability")
            .field("name", &self.definition.name())
            .field("hints", self.definition.hints())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct EchoParams {
        /// Text to echo back.
        text: String,
    }

    #[tokio::test]
    async fn test_typed_capability() {
        let capability = ToolCapability::typed::<EchoParams, _, _>(
            "echo",
            "Echo text",
            ToolHints::read_only("Echo"),
            |params| async move { Ok(vec![Content::text(params.text)]) },
        )
        .unwrap();

        let schema = capability.definition().input_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].get("text").is_some());

        let mut args = JsonObject::new();
        args.insert("text".into(), "hello".into());
        let content = capability.bind(args).unwrap().await.unwrap();
        assert_eq!(content.len(), 1);
    }

    #[test]
    fn test_non_object_params_rejected() {
        let result = ToolCapability::typed::<String, _, _>(
            "scalar",
            "Takes a bare string",
            ToolHints::read_only("Scalar"),
            |_| async { Ok(Vec::new()) },
        );
        assert!(matches!(result, Err(SchemaError::Malformed { .. })));
    }

    #[test]
    fn test_undecodable_arguments() {
        let capability = ToolCapability::typed::<EchoParams, _, _>(
            "echo",
            "Echo text",
            ToolHints::read_only("Echo"),
            |params| async move { Ok(vec![Content::text(params.text)]) },
        )
        .unwrap();

        let err = capability.bind(JsonObject::new()).err().unwrap();
        assert_eq!(err.path, "$");
    }
}
