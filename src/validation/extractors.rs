//! Axum integration for automatic model validation

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{request::Parts, Extensions},
    response::{IntoResponse, Response},
    Form, Json,
};
use std::any::Any;
use std::sync::Arc;

use super::filter::{ActionExecutingContext, ModelValidationFilter};
use crate::common::validation::ValidationContext;
use crate::common::ApiError;

/// Bound handler arguments exposed to model validation
pub trait ActionArguments {
    fn action_arguments(&self) -> Vec<ValidationContext<'_>>;
}

macro_rules! impl_action_arguments_for_wrapper {
    ($($wrapper:ident),+) => {
        $(
            impl<T: Any> ActionArguments for $wrapper<T> {
                fn action_arguments(&self) -> Vec<ValidationContext<'_>> {
                    vec![ValidationContext::new(&self.0)]
                }
            }
        )+
    };
}

impl_action_arguments_for_wrapper!(Json, Query, Path, Form);

macro_rules! impl_action_arguments_for_tuple {
    ($($ty:ident),+) => {
        impl<$($ty: ActionArguments),+> ActionArguments for ($($ty,)+) {
            #[allow(non_snake_case)]
            fn action_arguments(&self) -> Vec<ValidationContext<'_>> {
                let ($($ty,)+) = self;
                let mut arguments = Vec::new();
                $(arguments.extend($ty.action_arguments());)+
                arguments
            }
        }
    };
}

impl_action_arguments_for_tuple!(A1);
impl_action_arguments_for_tuple!(A1, A2);
impl_action_arguments_for_tuple!(A1, A2, A3);
impl_action_arguments_for_tuple!(A1, A2, A3, A4);

/// Extractor that runs model validation over the arguments bound by `A`
///
/// `A` is extracted first. If extraction fails its rejection is returned
/// untouched and no model validation happens. Otherwise every bound value is
/// checked against its registered validator, and any failure rejects the
/// request with 422 and the field-keyed report.
///
/// Requires an `Extension<Arc<ModelValidationFilter>>` layer.
#[derive(Debug, Clone)]
pub struct Validated<A>(pub A);

fn validation_filter(extensions: &Extensions) -> Result<Arc<ModelValidationFilter>, Response> {
    extensions
        .get::<Arc<ModelValidationFilter>>()
        .cloned()
        .ok_or_else(|| {
            ApiError::InternalServer("missing model validation filter".to_string()).into_response()
        })
}

fn run_filter<A: ActionArguments>(
    filter: &ModelValidationFilter,
    arguments: A,
) -> Result<Validated<A>, Response> {
    let rejection = {
        let mut context = ActionExecutingContext::new(arguments.action_arguments());
        filter.on_action_executing(&mut context);
        context.result
    };

    match rejection {
        Some(response) => Err(response),
        None => Ok(Validated(arguments)),
    }
}

#[async_trait]
impl<S, A> FromRequest<S> for Validated<A>
where
    A: FromRequest<S> + ActionArguments + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let filter = validation_filter(req.extensions())?;

        let arguments = A::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        run_filter(&filter, arguments)
    }
}

#[async_trait]
impl<S, A> FromRequestParts<S> for Validated<A>
where
    A: FromRequestParts<S> + ActionArguments + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let filter = validation_filter(&parts.extensions)?;

        let arguments = A::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        run_filter(&filter, arguments)
    }
}
