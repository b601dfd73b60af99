//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum that maps to HTTP status codes.

use serde::Serialize;

/// エラー種別の列挙体
///
/// API が返しうるエラー分類です。ドメイン側のエラー
/// (`AuthError`, `ContentError`) は必ずいずれかに分類されます。
///
/// | 種別 | 用途 |
/// |------|------|
/// | `BadRequest` | 入力値の検証エラー |
/// | `Unauthorized` | 認証情報が無い/無効 (理由は返さない) |
/// | `Forbidden` | ロール不足・所有者不一致・凍結アカウント |
/// | `NotFound` | 対象が存在しない、または閲覧不可 |
/// | `Conflict` | 不変条件違反 (並び替え不一致、空の公開など) |
/// | `InternalServerError` | DB・ストレージなど外部依存の失敗 |
/// | `ServiceUnavailable` | 一時的な外部依存の停止 |
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::Conflict;
/// assert_eq!(kind.status_code(), 409);
/// assert_eq!(kind.as_str(), "Conflict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400 - 入力値が不正
    BadRequest,
    /// 401 - 認証が必要
    Unauthorized,
    /// 403 - アクセス権限なし
    Forbidden,
    /// 404 - リソースが見つからない
    NotFound,
    /// 409 - 現在の状態と競合
    Conflict,
    /// 500 - サーバー内部エラー
    InternalServerError,
    /// 503 - サービス利用不可
    ServiceUnavailable,
}

impl ErrorKind {
    /// HTTP ステータスコードを取得
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// HTTP ステータスの理由フレーズ
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx 系かどうか
    ///
    /// 5xx のメッセージはクライアントに返さず、ログにのみ残します。
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// 4xx 系かどうか
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
