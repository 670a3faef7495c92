// server/src/models/mod.rs

//! Rows of the canteen database and the nested views returned to clients.

pub mod caloric_tracker;
pub mod canteen;
pub mod food;
pub mod menu;
pub mod order;
pub mod review;
pub mod stall;
pub mod user;

pub use caloric_tracker::{
  CaloricTracker, CaloricTrackerEntry, EntryFoodView, EntryView, SubmittedEntryFood, TrackerEntryFood, TrackerView,
};
pub use canteen::{Canteen, CanteenView, Location};
pub use food::{Food, FoodPayload};
pub use menu::{Menu, MenuView};
pub use order::{Order, OrderFood, OrderFoodView, OrderView, SubmittedOrderFood};
pub use review::{Review, ReviewView};
pub use stall::{Stall, StallMenu, StallView};
pub use user::{PublicUser, PublicUserView, Role, User, UserView};
