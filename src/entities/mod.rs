pub mod prelude {
    pub use super::users::Entity as Users;
}

pub mod users;
