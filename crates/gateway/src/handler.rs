//! Default intent handler and clarification fallback.

use async_trait::async_trait;

use concierge_core::{
    traits::{ClarificationProvider, IntentHandler},
    types::{AuthenticatedUser, EntityMap, IntentResult, RouteResult},
    Result,
};

/// Roles that see staff-side screens.
const STAFF_ROLES: &[&str] = &["management", "hotel_staff"];

/// Answers the built-in concierge intents with templated text and a client
/// action. Low-confidence and unknown intents get no answer, which sends the
/// request to clarification.
pub struct DefaultIntentHandler {
    min_confidence: f64,
}

impl DefaultIntentHandler {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    fn is_staff(user: &AuthenticatedUser) -> bool {
        STAFF_ROLES.contains(&user.role.as_str())
    }
}

impl Default for DefaultIntentHandler {
    fn default() -> Self {
        Self::new(0.4)
    }
}

#[async_trait]
impl IntentHandler for DefaultIntentHandler {
    async fn handle(
        &self,
        intent: &IntentResult,
        _text: &str,
        entities: &EntityMap,
        user: &AuthenticatedUser,
    ) -> Result<RouteResult> {
        if intent.confidence < self.min_confidence {
            tracing::debug!(
                intent = %intent.label,
                confidence = intent.confidence,
                "Confidence below threshold"
            );
            return Ok(RouteResult::empty());
        }

        let room = entities.get("room_number");

        let route = match intent.label.as_str() {
            "book_room" => {
                let mut answer = "I can help you book a room".to_string();
                if let Some(date) = entities.get("date") {
                    answer.push_str(&format!(" for {}", date));
                }
                if let Some(qty) = entities.get("quantity") {
                    answer.push_str(&format!(" ({} guests)", qty));
                }
                answer.push_str(". Opening the room booking page.");
                RouteResult::new(answer, "open_room_booking")
            }
            "order_meal" => {
                let meal = entities.get("meal_type").map(String::as_str).unwrap_or("meal");
                let answer = match room {
                    Some(room) => format!("Let's get your {} ordered to room {}.", meal, room),
                    None => format!("Let's get your {} ordered.", meal),
                };
                RouteResult::new(answer, "open_meal_order")
            }
            "room_service" => {
                let answer = match room {
                    Some(room) => format!("I've noted your room service request for room {}.", room),
                    None => "I've noted your room service request.".to_string(),
                };
                RouteResult::new(answer, "open_room_services")
            }
            "booking_status" if Self::is_staff(user) => {
                RouteResult::new("Here is the bookings overview.", "open_booking_list")
            }
            "booking_status" => RouteResult::new("Here are your bookings.", "open_my_bookings"),
            "greeting" => RouteResult {
                answer: Some("Hello! How can I help you today?".to_string()),
                action: None,
            },
            "farewell" => RouteResult {
                answer: Some("You're welcome! Enjoy your stay.".to_string()),
                action: None,
            },
            _ => RouteResult::empty(),
        };

        Ok(route)
    }
}

/// Asks the user to restate their input, quoting it back.
pub struct TemplateClarifier;

#[async_trait]
impl ClarificationProvider for TemplateClarifier {
    async fn clarify(&self, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Ok("Sorry, I didn't catch that. Could you say it again?".to_string());
        }
        Ok(format!(
            "Sorry, I'm not sure what you mean by \"{}\". Could you rephrase? \
             I can help with room bookings, meals and room service.",
            text
        ))
    }
}
