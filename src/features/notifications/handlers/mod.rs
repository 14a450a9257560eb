pub mod notification_handler;

pub use notification_handler::{
    __path_get_my_notifications, __path_mark_notification_as_read, get_my_notifications,
    mark_notification_as_read,
};
