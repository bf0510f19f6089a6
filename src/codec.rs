use crate::{
    errors,
    registry::record::{EquipmentList, EquipmentRecord},
};

pub const CONNECTION_OK_TOKEN: &str = "CONEXAO_OK";
pub const PONG_TOKEN: &str = "PONG";
pub const NOT_FOUND_TOKEN: &str = "NOT_FOUND";
pub const ERROR_PREFIX: &str = "ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    GetAll,
    Get { id: i64 },
    Alter { id: i64, status: bool },
    ConnectTest,
    Ping,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetAll => "GET_ALL",
            Request::Get { .. } => "GET",
            Request::Alter { .. } => "ALTER",
            Request::ConnectTest => "CONNECT_TEST",
            Request::Ping => "PING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    ConnectionOk,
    Pong,
    NotFound,
    Record(EquipmentRecord),
    Registry(EquipmentList),
    Error(String),
}

// Parse one datagram payload into a request.
//
// Tokens are whitespace separated; the first one names the command. Tokens past
// the command's arity are ignored.
pub fn decode(bytes: &[u8]) -> errors::Result<Request> {
    let text = String::from_utf8_lossy(bytes);
    let mut tokens = text.split_whitespace();

    let command = tokens.next().ok_or(errors::Errors::EmptyPayload)?;

    match command {
        "GET_ALL" | "get_all" => Ok(Request::GetAll),
        "GET" | "get" => {
            let id = parse_id(tokens.next())?;
            Ok(Request::Get { id })
        }
        "ALTER" | "ALTERAR_ITEM" => {
            let id = parse_id(tokens.next())?;
            let status = parse_status(tokens.next())?;
            Ok(Request::Alter { id, status })
        }
        "CONNECT_TEST" | "TESTE_CONEXAO" => Ok(Request::ConnectTest),
        "PING" => Ok(Request::Ping),
        other => Err(errors::Errors::UnknownCommand(other.to_string())),
    }
}

fn parse_id(token: Option<&str>) -> errors::Result<i64> {
    let token = token.ok_or_else(|| errors::Errors::BadArgument("missing id".to_string()))?;

    token
        .parse()
        .map_err(|_| errors::Errors::BadArgument(format!("invalid id: {}", token)))
}

// Only the exact literals `true` and `false` are accepted.
fn parse_status(token: Option<&str>) -> errors::Result<bool> {
    match token {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(errors::Errors::BadArgument(format!(
            "invalid status: {}",
            other
        ))),
        None => Err(errors::Errors::BadArgument("missing status".to_string())),
    }
}

pub fn encode(response: &Response) -> Vec<u8> {
    let payload = match response {
        Response::ConnectionOk => CONNECTION_OK_TOKEN.to_string(),
        Response::Pong => PONG_TOKEN.to_string(),
        Response::NotFound => NOT_FOUND_TOKEN.to_string(),
        Response::Record(record) => to_json(record),
        Response::Registry(list) => to_json(list),
        Response::Error(message) => format!("{} {}", ERROR_PREFIX, message),
    };

    payload.into_bytes()
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("Failed to serialize response: {}", e);
        format!("{} failed to serialize response", ERROR_PREFIX)
    })
}
