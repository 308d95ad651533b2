//! Request-scoped context passed explicitly into every service operation.

use uuid::Uuid;

/// Who is calling and under which request id. Used for log correlation;
/// authentication is the transport's concern.
#[derive(Debug, Clone)]
pub struct RequestContext {
  pub request_id: Uuid,
  /// The profile acting, when the transport knows it.
  pub actor:      Option<Uuid>,
}

impl RequestContext {
  pub fn new(request_id: Uuid, actor: Option<Uuid>) -> Self {
    Self { request_id, actor }
  }

  /// A context with a fresh request id and no known actor.
  pub fn anonymous() -> Self { Self::new(Uuid::new_v4(), None) }
}

impl Default for RequestContext {
  fn default() -> Self { Self::anonymous() }
}
