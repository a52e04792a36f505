//! Default parameter binding.

use praxis_core::{
    ActionContext, ActionError, Arguments, BoxFuture, HandlerDescriptor, ParameterBinder,
    ValueProvider,
};

/// Binds handler parameters from the context's value providers.
///
/// Providers are consulted in factory order and the first value found wins.
/// A required parameter with no value is recorded in the model state; it
/// does not fault the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueProviderBinder;

impl ParameterBinder for ValueProviderBinder {
    fn bind<'a>(
        &'a self,
        ctx: &'a mut ActionContext,
        handler: &'a HandlerDescriptor,
    ) -> BoxFuture<'a, Result<Arguments, ActionError>> {
        Box::pin(async move {
            let mut providers: Vec<Box<dyn ValueProvider>> = Vec::new();
            for factory in ctx.value_provider_factories() {
                if let Some(provider) = factory.create_value_provider(ctx)? {
                    providers.push(provider);
                }
            }

            let mut arguments = Arguments::new();
            for parameter in handler.parameters() {
                let name = parameter.name();
                match providers.iter().find_map(|provider| provider.get_value(name)) {
                    Some(value) => arguments.insert(name, value),
                    None if parameter.is_required() => ctx
                        .model_state_mut()
                        .add_error(name, format!("The {name} field is required.")),
                    None => {}
                }
            }
            Ok(arguments)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use praxis_core::{
        ActionDescriptor, HandlerMethod, HttpContext, ParameterDescriptor,
        QueryStringValueProviderFactory, RouteData, RouteValueProviderFactory,
    };
    use std::sync::Arc;

    fn handler() -> HandlerDescriptor {
        HandlerDescriptor::new(Method::GET, HandlerMethod::unit(|_| async { Ok(()) }))
            .with_parameter(ParameterDescriptor::required("id"))
            .with_parameter(ParameterDescriptor::optional("sort"))
            .with_parameter(ParameterDescriptor::required("tenant"))
    }

    fn ctx(uri: &'static str, route: RouteData) -> ActionContext {
        ActionContext::new(
            Arc::new(ActionDescriptor::new("/Orders")),
            HttpContext::new(Method::GET, uri.parse().unwrap()),
            route,
        )
        .with_value_provider_factories(vec![
            Arc::new(RouteValueProviderFactory),
            Arc::new(QueryStringValueProviderFactory),
        ])
    }

    #[tokio::test]
    async fn test_first_provider_wins() {
        let mut ctx = ctx("/?id=9&sort=asc&tenant=acme", RouteData::new().with("id", "7"));
        let handler = handler();
        let args = ValueProviderBinder.bind(&mut ctx, &handler).await.unwrap();

        assert_eq!(args.get_as::<u32>("id").unwrap(), 7);
        assert_eq!(args.get_as::<String>("sort").unwrap(), "asc");
        assert!(ctx.model_state().is_valid());
    }

    #[tokio::test]
    async fn test_missing_required_goes_to_model_state() {
        let mut ctx = ctx("/?id=9", RouteData::new());
        let handler = handler();
        let args = ValueProviderBinder.bind(&mut ctx, &handler).await.unwrap();

        assert_eq!(args.len(), 1);
        assert!(!ctx.model_state().is_valid());
        assert_eq!(
            ctx.model_state().errors_for("tenant"),
            ["The tenant field is required."]
        );
        assert!(ctx.model_state().errors_for("sort").is_empty());
    }

    #[tokio::test]
    async fn test_no_factories_binds_nothing() {
        let mut ctx = ActionContext::default();
        let handler = handler();
        let args = ValueProviderBinder.bind(&mut ctx, &handler).await.unwrap();
        assert!(args.is_empty());
        assert_eq!(ctx.model_state().error_count(), 2);
    }
}
