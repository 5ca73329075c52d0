mod chat;
mod matching;
mod profile;
mod state;
mod user_status;

pub use chat::{
    ChatMessage, ChatRoom, ClientEvent, CreateRoomRequest, CreateRoomResponse, LastMessage,
    MessagePage, MessagePayload, MessageType, RoomSummary, SendMessageRequest,
    SendMessageResponse, ServerEvent,
};
pub use matching::{MatchScore, ProfileSummary, Recommendation, RecommendationsResponse};
pub use profile::{Candidate, Gender, UserProfile};
pub use state::AppState;
pub use user_status::UserStatus;
