pub mod channels;
pub mod notification;

pub use channels::{
    NotificationConsumer, NotificationProducer, Reporter, create_notification_channel, drain,
};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
