// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    models::auth::{Role, User},
};

/// 1. O Trait que define quais cargos passam pelo guardião
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

/// 2. O Extractor (Guardião): exige que o usuário autenticado tenha um
/// dos cargos permitidos. Depende do `auth_guard` já ter rodado.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().ok_or(AppError::InvalidToken)?;

        if !T::allowed().contains(&user.role) {
            return Err(AppError::Forbidden);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS GUARDIÕES
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
}

pub struct StaffOnly;
impl RoleDef for StaffOnly {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::Receptionist]
    }
}
