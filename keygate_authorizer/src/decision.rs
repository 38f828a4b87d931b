//! The access decision and the policy document it is rendered into
//!
//! The document layout is fixed by the invoking gateway: the envelope keys
//! are camelCase while the policy keys use the IAM capitalized spelling.
//!
//! ```json
//! {
//!   "principalId": "user",
//!   "policyDocument": {
//!     "Version": "2012-10-17",
//!     "Statement": [
//!       { "Action": ["execute-api:Invoke"], "Effect": "Allow", "Resource": ["<resourceArn>"] }
//!     ]
//!   },
//!   "context": { "userEntity": "<sub>" }
//! }
//! ```

use keygate::jwt::SubjectRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The principal named in every decision
pub const PRINCIPAL: &str = "user";

/// The policy language version understood by the gateway
pub const POLICY_VERSION: &str = "2012-10-17";

/// The action granted by a decision
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// The context key carrying the authenticated subject
pub const USER_ENTITY: &str = "userEntity";

/// Whether a statement grants or refuses access
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Access is granted
    Allow,
    /// Access is refused
    Deny,
}

/// An access decision for one request
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Decision {
    effect: Effect,
    principal_id: String,
    resource: String,
    context: Map<String, Value>,
}

impl Decision {
    /// Grants the authenticated `subject` access to `resource`
    pub fn allow(subject: &SubjectRef, resource: impl Into<String>) -> Self {
        let mut context = Map::new();
        context.insert(USER_ENTITY.to_owned(), Value::from(subject.as_str()));

        Self {
            effect: Effect::Allow,
            principal_id: PRINCIPAL.to_owned(),
            resource: resource.into(),
            context,
        }
    }

    /// Explicitly refuses access to `resource`
    ///
    /// The authorizer itself never builds one of these; failures are
    /// reported as errors. Hosts whose gateway requires an explicit deny
    /// document can render one with this.
    pub fn deny(resource: impl Into<String>) -> Self {
        Self {
            effect: Effect::Deny,
            principal_id: PRINCIPAL.to_owned(),
            resource: resource.into(),
            context: Map::new(),
        }
    }

    /// Adds an entry to the context handed to downstream consumers
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// The effect of this decision
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Whether access is granted
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    /// The principal the decision applies to
    #[must_use]
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    /// The resource the decision applies to
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The identity context
    #[must_use]
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    /// The authenticated subject, for an allow decision
    #[must_use]
    pub fn user_entity(&self) -> Option<&str> {
        self.context.get(USER_ENTITY).and_then(Value::as_str)
    }

    /// Renders the decision as the gateway's policy document
    pub fn to_response(&self) -> AuthorizerResponse {
        AuthorizerResponse::from(self.clone())
    }
}

/// The document returned to the gateway
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    /// The principal the policy applies to
    pub principal_id: String,

    /// The access policy
    pub policy_document: PolicyDocument,

    /// Values forwarded to downstream consumers
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl AuthorizerResponse {
    /// The effect of the first statement
    #[must_use]
    pub fn effect(&self) -> Option<Effect> {
        self.policy_document.statement.first().map(|s| s.effect)
    }
}

impl From<Decision> for AuthorizerResponse {
    fn from(decision: Decision) -> Self {
        Self {
            principal_id: decision.principal_id,
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_owned(),
                statement: vec![Statement {
                    action: vec![INVOKE_ACTION.to_owned()],
                    effect: decision.effect,
                    resource: vec![decision.resource],
                }],
            },
            context: decision.context,
        }
    }
}

/// An IAM-style policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// The policy language version
    pub version: String,

    /// The statements making up the policy
    pub statement: Vec<Statement>,
}

/// A single grant or refusal within a policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// The actions covered
    pub action: Vec<String>,

    /// Whether the actions are granted or refused
    pub effect: Effect,

    /// The resources covered
    pub resource: Vec<String>,
}
