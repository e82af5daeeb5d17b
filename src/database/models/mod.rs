/// Declares a status enum persisted as lowercase text.
macro_rules! text_enum {
    ($(#[$attr:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

pub mod appointment;
pub mod car;
pub mod client;
pub mod employee;
pub mod repair;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, CreateAppointment, UpdateAppointment};
pub use car::{Car, CreateCar, UpdateCar};
pub use client::{Client, CreateClient, UpdateClient};
pub use employee::{CreateEmployee, Employee, UpdateEmployee};
pub use repair::{CreateRepair, Repair, RepairStatus, UpdateRepair};
pub use user::{CreateUser, LoginRequest, RegisterUser, UpdateUser, User};

/// Emails compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims optional free text, collapsing blank values to `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
