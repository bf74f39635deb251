use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::cache::DishStore;
use crate::error::CookError;
use crate::interpreter::{Completion, ResponseFormat, ResponseInterpreter, placeholder_dish, unavailable_dish};
use crate::key::{KeyDerivation, derive_key};
use crate::llm::DishGenerator;
use crate::metrics::{
    CACHE_HITS, CACHE_MISSES, CACHE_SIZE, DEGRADED_KEYS, GENERATION_FAILURES, REQUEST_LATENCY,
    SOFT_FAILURES,
};
use crate::models::{CookRequest, Dish};
use crate::prompt::render_prompt;

#[derive(Clone, Copy, Debug)]
pub struct KitchenSettings {
    pub format: ResponseFormat,
    // None = no cap on ingredient count
    pub max_ingredients: Option<usize>,
    // On a blocked reply, serve the hand-authored dish instead of failing the cook
    pub serve_unavailable_placeholder: bool,
}

impl Default for KitchenSettings {
    fn default() -> Self {
        Self {
            format: ResponseFormat::Extended,
            max_ingredients: None,
            serve_unavailable_placeholder: true,
        }
    }
}

/// Reject malformed requests before touching the store or the generator.
pub fn validate(request: &CookRequest, max_ingredients: Option<usize>) -> Result<(), CookError> {
    if request.ingredients.is_empty() {
        return Err(CookError::validation("At least one ingredient is required."));
    }
    if let Some(max) = max_ingredients {
        if request.ingredients.len() > max {
            return Err(CookError::validation(format!(
                "Maximum {max} ingredients allowed."
            )));
        }
    }
    if request.method.trim().is_empty() {
        return Err(CookError::validation("A cooking method is required."));
    }
    for (idx, ing) in request.ingredients.iter().enumerate() {
        if ing.name.trim().is_empty() {
            return Err(CookError::validation(format!(
                "Ingredient #{} has no name.",
                idx + 1
            )));
        }
        if !(ing.quantity.is_finite() && ing.quantity > 0.0) {
            return Err(CookError::validation(format!(
                "Quantity for '{}' must be greater than zero.",
                ing.name.trim()
            )));
        }
        if ing.unit.trim().is_empty() {
            return Err(CookError::validation(format!(
                "Ingredient '{}' has no unit.",
                ing.name.trim()
            )));
        }
    }
    Ok(())
}

// One cook: key -> store lookup -> (miss) generate, interpret, store
pub struct Kitchen {
    store: Arc<dyn DishStore>,
    generator: Arc<dyn DishGenerator>,
    interpreter: ResponseInterpreter,
    settings: KitchenSettings,
}

impl Kitchen {
    pub fn new(
        store: Arc<dyn DishStore>,
        generator: Arc<dyn DishGenerator>,
        settings: KitchenSettings,
    ) -> Self {
        Self {
            store,
            generator,
            interpreter: ResponseInterpreter::new(settings.format),
            settings,
        }
    }

    pub fn store(&self) -> &Arc<dyn DishStore> {
        &self.store
    }

    pub fn settings(&self) -> KitchenSettings {
        self.settings
    }

    pub async fn cook(&self, request: &CookRequest) -> Result<Dish, CookError> {
        validate(request, self.settings.max_ingredients)?;
        let start_time = Instant::now();

        let KeyDerivation { key, degraded } = derive_key(
            &request.ingredients,
            &request.method,
            request.method_effect.as_deref(),
        );
        if degraded {
            DEGRADED_KEYS.inc();
        }

        if let Some(mut dish) = self.store.lookup(&key).await {
            CACHE_HITS.inc();
            info!(key = %key.digest(), name = %dish.name, "cache hit");
            dish.is_new_discovery = false;
            REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
            return Ok(dish);
        }
        CACHE_MISSES.inc();
        info!(key = %key.digest(), "cache miss, asking the generator");

        // no store access is held across this call
        let prompt = render_prompt(request, self.interpreter.format());
        let completion = match self.generator.complete(&prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                GENERATION_FAILURES.inc();
                error!(key = %key.digest(), error = %e, "generation call failed");
                return Err(CookError::Internal(e.to_string()));
            }
        };

        let Some(dish) = self.interpreter.interpret(&completion) else {
            GENERATION_FAILURES.inc();
            let reason = match &completion {
                Completion::Blocked { reason } => reason.clone(),
                Completion::Text(_) => "empty reply".to_string(),
            };
            warn!(key = %key.digest(), %reason, "no dish generated, not caching");
            REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
            if self.settings.serve_unavailable_placeholder {
                return Ok(unavailable_dish());
            }
            return Err(CookError::GenerationUnavailable(reason));
        };

        if dish == placeholder_dish() {
            SOFT_FAILURES.inc();
        }

        self.store.insert(&key, &dish).await;
        CACHE_SIZE.set(self.store.len().await as f64);
        info!(key = %key.digest(), name = %dish.name, quality = %dish.quality, "new dish cached");

        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
        Ok(dish)
    }
}
