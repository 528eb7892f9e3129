use tracing::error;

use crate::web::{Handler, Middleware, handler, middleware, respond};

/// Turns any error from the inner chain into its JSON error document.
///
/// Shutdown errors are answered and then returned so dispatch can stop the
/// service; everything else is absorbed here.
pub fn errors() -> Middleware {
    middleware(|next: Handler| {
        handler(move |ctx, req| {
            let next = next.clone();
            async move {
                let err = match next(ctx.clone(), req).await {
                    Ok(response) => return Ok(response),
                    Err(err) => err,
                };

                error!(trace_id = %ctx.trace_id(), kind = ?err.kind, error = %err, "request failed");

                let (status, document) = err.classify();
                let response = respond(&ctx, status, &document)?;

                if err.is_shutdown() {
                    return Err(err);
                }
                Ok(response)
            }
        })
    })
}
