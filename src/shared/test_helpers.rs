#[cfg(test)]
use crate::features::auth::model::AuthenticatedUser;
#[cfg(test)]
use crate::features::users::models::UserRole;

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
pub fn create_user(role: UserRole) -> AuthenticatedUser {
    let user_id = Uuid::new_v4();
    AuthenticatedUser {
        user_id,
        role,
        email: format!("{}@example.test", user_id.simple()),
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub fn create_super_admin_user() -> AuthenticatedUser {
    create_user(UserRole::SuperAdmin)
}

#[cfg(test)]
#[allow(dead_code)]
async fn inject_super_admin_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(create_super_admin_user());
    next.run(request).await
}

#[cfg(test)]
#[allow(dead_code)]
pub fn with_super_admin_auth(router: Router) -> Router {
    router.layer(axum::middleware::from_fn(inject_super_admin_middleware))
}

/// Layer that authenticates every request as `user`
#[cfg(test)]
pub fn with_auth(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let user = user.clone();
            async move {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
        },
    ))
}
