use tungstenite::Message;

use crate::{
    error::{Result, ValidationError},
    models::communication::{ClientCommand, CommandTokenPair, ServerEvent},
};

pub const MAX_NICKNAME_LEN: usize = 20;

pub fn parse_event(msg: &Message) -> Result<ServerEvent> {
    let event = serde_json::from_str(msg.to_text()?)?;
    Ok(event)
}

pub fn command_message(command: ClientCommand, token: Option<String>) -> Result<Message> {
    let pair = CommandTokenPair { command, token };
    Ok(Message::Text(serde_json::to_string(&pair)?))
}

pub fn validate_pin(pin: &str) -> std::result::Result<String, ValidationError> {
    let pin = pin.trim();
    if pin.is_empty() {
        return Err(ValidationError::EmptyPin);
    }
    if !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::MalformedPin);
    }
    Ok(pin.to_string())
}

pub fn validate_nickname(nickname: &str) -> std::result::Result<String, ValidationError> {
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(ValidationError::EmptyNickname);
    }
    if nickname.chars().count() > MAX_NICKNAME_LEN {
        return Err(ValidationError::NicknameTooLong(MAX_NICKNAME_LEN));
    }
    Ok(nickname.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::communication::{GameError, PinPayload};

    #[test]
    fn parses_text_frames() {
        let msg = Message::Text(r#"{"event":"game_error","data":{"message":"room closed"}}"#.into());
        let event = parse_event(&msg).unwrap();
        assert_eq!(
            event,
            ServerEvent::GameError(GameError {
                message: "room closed".to_string()
            })
        );
    }

    #[test]
    fn rejects_unknown_events() {
        let msg = Message::Text(r#"{"event":"dance","data":{}}"#.into());
        assert!(parse_event(&msg).is_err());
    }

    #[test]
    fn command_message_is_a_text_frame() {
        let msg = command_message(
            ClientCommand::LeaveGame(PinPayload {
                pin: "42".to_string(),
            }),
            None,
        )
        .unwrap();
        assert_eq!(
            msg,
            Message::Text(r#"{"event":"leave_game","data":{"pin":"42"}}"#.to_string())
        );
    }

    #[test]
    fn validates_join_input() {
        assert_eq!(validate_pin("  123456 "), Ok("123456".to_string()));
        assert_eq!(validate_pin(""), Err(ValidationError::EmptyPin));
        assert_eq!(validate_pin("12a4"), Err(ValidationError::MalformedPin));
        assert_eq!(validate_nickname("   "), Err(ValidationError::EmptyNickname));
        assert_eq!(
            validate_nickname(&"x".repeat(MAX_NICKNAME_LEN + 1)),
            Err(ValidationError::NicknameTooLong(MAX_NICKNAME_LEN))
        );
        assert_eq!(validate_nickname("ann"), Ok("ann".to_string()));
    }
}
