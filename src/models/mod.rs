pub mod account;
pub mod team;
pub mod training;

pub use account::{
    AccountLink, AttachWebDeviceRequest, GetMeResponse, LinkedPerson, LoginRequest, LoginResponse,
    TeamMembership,
};
pub use team::{GetMyTeamHomeResponse, ListTeamMembersResponse, Member, TrainingSummary};
pub use training::{ScheduleTrainingRequest, ScheduleTrainingResponse};
