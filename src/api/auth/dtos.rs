use serde::{Deserialize, Serialize};

// Claims embedded in a session token. Parsed strictly: a payload missing
// the required fields fails verification instead of yielding empty claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub exp: u64, // expiry, Unix seconds
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginSuccessDto {
    pub user: Claims,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct MeResponseDto {
    pub user: Claims,
}

// Posted by the bot backend after it has authenticated the user itself
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateHandoffSessionDto {
    pub user_id: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HandoffSessionCreatedDto {
    pub session_token: String,
}
