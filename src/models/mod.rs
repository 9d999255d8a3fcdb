pub mod itemmodel;
pub mod notificationmodel;
pub mod pointsmodel;
pub mod referralmodel;
pub mod usermodel;
