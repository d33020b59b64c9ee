//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod authenticate_connection;
pub mod deliver;
pub mod disconnect_connection;
pub mod error;
pub mod notification_dispatcher;
pub mod relay_message;
pub mod session;

pub use authenticate_connection::AuthenticateConnectionUseCase;
pub use deliver::send_json;
pub use disconnect_connection::DisconnectConnectionUseCase;
pub use error::{AuthenticateError, DeliveryError, RelayError};
pub use notification_dispatcher::{DeliveryOutcome, LikeTarget, NotificationDispatcher};
pub use relay_message::RelayMessageUseCase;
pub use session::ConnectionSession;
