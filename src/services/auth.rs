// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{
        AuthResponse, AuthUserSummary, Claims, CreateUserPayload, RegisterUserPayload, Role,
        UpdateUserPayload, User,
    },
    services::notifier::{self, Notifier},
};

/// Verifica a força da senha: mínimo 8 caracteres, com minúscula,
/// maiúscula e dígito.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters long".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::InvalidInput(
            "Password must contain at least one lowercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::InvalidInput(
            "Password must contain at least one uppercase letter".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(
            "Password must contain at least one number".into(),
        ));
    }
    Ok(())
}

// O hashing do bcrypt é pesado; roda em thread separada como sempre.
async fn hash_password(password: String) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    notifier: Arc<dyn Notifier>,
    jwt_secret: String,
    base_url: String,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        notifier: Arc<dyn Notifier>,
        jwt_secret: String,
        base_url: String,
    ) -> Self {
        Self {
            user_repo,
            notifier,
            jwt_secret,
            base_url,
        }
    }

    // Registro público: cargo sempre client, conta nasce não verificada e
    // recebe o link de verificação por e-mail.
    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<User, AppError> {
        let password_hash = match payload.password {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(password).await?)
            }
            // Clientes podem ser cadastrados sem senha (check-in na portaria)
            None => None,
        };

        let verification_token = Uuid::new_v4().simple().to_string();

        let user = self
            .user_repo
            .create_user(
                &payload.email,
                &payload.first_name,
                &payload.last_name,
                Role::Client,
                password_hash.as_deref(),
                false,
                Some(&verification_token),
                None,
            )
            .await?;

        let verify_link = format!("{}/api/auth/verify/{}", self.base_url, verification_token);
        notifier::dispatch(
            self.notifier.clone(),
            user.email.clone(),
            "Verify Your Email - InkedInLIFT".to_string(),
            format!(
                "<p>Hi {}, please verify your email by clicking the link below:</p>\
                 <p><a href=\"{link}\">{link}</a></p>",
                user.first_name,
                link = verify_link
            ),
        );

        Ok(user)
    }

    // Criação por admin/recepcionista: pode definir cargo e pular a verificação
    pub async fn admin_create_user(
        &self,
        payload: CreateUserPayload,
        actor: &User,
    ) -> Result<User, AppError> {
        let role = payload.role.unwrap_or(Role::Client);

        // Cargos de staff exigem senha; cliente pode ficar sem
        if role != Role::Client && payload.password.is_none() {
            return Err(AppError::InvalidInput(
                "Password is required for non-client roles".into(),
            ));
        }

        let password_hash = match payload.password {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(password).await?)
            }
            None => None,
        };

        let verified = payload.verified.unwrap_or(false);
        let verification_token = if verified {
            None
        } else {
            Some(Uuid::new_v4().simple().to_string())
        };

        let user = self
            .user_repo
            .create_user(
                &payload.email,
                &payload.first_name,
                &payload.last_name,
                role,
                password_hash.as_deref(),
                verified,
                verification_token.as_deref(),
                Some(actor.id),
            )
            .await?;

        if let Some(token) = verification_token {
            let verify_link = format!("{}/api/auth/verify/{}", self.base_url, token);
            notifier::dispatch(
                self.notifier.clone(),
                user.email.clone(),
                "Verify Your Email - InkedInLIFT".to_string(),
                format!(
                    "<p>Hi {}, please verify your email by clicking the link below:</p>\
                     <p><a href=\"{link}\">{link}</a></p>",
                    user.first_name,
                    link = verify_link
                ),
            );
        }

        Ok(user)
    }

    pub async fn verify_email(&self, token: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_verification_token(token)
            .await?
            .ok_or(AppError::InvalidToken)?;

        self.user_repo.mark_verified(user.id).await?;
        Ok(())
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_hash = user
            .password_hash
            .clone()
            .ok_or(AppError::InvalidCredentials)?;

        // Executa a verificação em um thread separado
        let password = password.to_owned();
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password, &password_hash))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        if !user.verified {
            return Err(AppError::EmailNotVerified);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse {
            message: "Login successful".to_string(),
            token,
            user: AuthUserSummary {
                id: user.id,
                email: user.email,
                role: user.role,
            },
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let reset_token = Uuid::new_v4().simple().to_string();
        let expiry = Utc::now() + chrono::Duration::hours(1);
        self.user_repo
            .set_reset_token(user.id, &reset_token, expiry)
            .await?;

        let reset_link = format!("{}/api/auth/reset/{}", self.base_url, reset_token);
        notifier::dispatch(
            self.notifier.clone(),
            user.email.clone(),
            "Password Reset - InkedInLIFT".to_string(),
            format!(
                "<p>Click below to reset your password (link valid for 1 hour):</p>\
                 <p><a href=\"{link}\">{link}</a></p>",
                link = reset_link
            ),
        );

        Ok(())
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), AppError> {
        validate_password(password)?;

        let user = self
            .user_repo
            .find_by_valid_reset_token(token, Utc::now())
            .await?
            .ok_or(AppError::InvalidToken)?;

        let password_hash = hash_password(password.to_owned()).await?;
        self.user_repo.set_password(user.id, &password_hash).await?;
        Ok(())
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        payload: UpdateUserPayload,
        actor: &User,
    ) -> Result<User, AppError> {
        // Só admin promove/rebaixa cargos
        if payload.role.is_some() && actor.role != Role::Admin {
            return Err(AppError::Forbidden);
        }

        self.user_repo
            .update_user(
                id,
                payload.email.as_deref(),
                payload.first_name.as_deref(),
                payload.last_name.as_deref(),
                payload.role,
                payload.verified,
                Some(actor.id),
            )
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn delete_user(&self, id: Uuid, actor: &User) -> Result<(), AppError> {
        if !self.user_repo.soft_delete(id, actor.id).await? {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_all().await
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            role: user.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_password_passes() {
        assert!(validate_password("Sup3rSecret").is_ok());
    }

    #[test]
    fn short_password_fails() {
        assert!(validate_password("Ab1").is_err());
    }

    #[test]
    fn password_needs_uppercase_lowercase_and_digit() {
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }
}
