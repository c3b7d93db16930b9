use crate::error::SimulationError;
use crate::model::{ProductBaseline, Scenario, SimulationInput, SimulationResult, SimulationScope};
use configuration::ElasticityParams;
use rust_decimal::Decimal;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// What one product contributes to the aggregate result under a scenario.
#[derive(Debug, Clone, Default, PartialEq)]
struct Contribution {
    net_profit: Decimal,
    revenue: Decimal,
    gross_sales: Decimal,
    orders: Decimal,
}

/// Applies the scenario's deltas to one product baseline.
fn perturb(product: &ProductBaseline, scenario: &Scenario, params: &ElasticityParams) -> Contribution {
    if scenario.is_killed {
        return Contribution::default();
    }

    let price_delta = scenario.price_delta_pct / HUNDRED;
    let ad_delta = scenario.ad_delta_pct / HUNDRED;
    let improvement = scenario.return_rate_improvement_pct / HUNDRED;
    let cogs_delta = scenario.cogs_delta_pct / HUNDRED;

    // Volume responds to price (elastic, dampened) and to ad budget
    // (with decaying effectiveness), never below zero.
    let volume_multiplier = ((Decimal::ONE - price_delta * params.price_elasticity)
        * (Decimal::ONE + ad_delta * params.ad_decay))
        .max(Decimal::ZERO);

    let new_orders = product.orders * volume_multiplier;
    let new_unit_price = product.unit_price * (Decimal::ONE + price_delta);
    let new_return_rate = (product.return_rate_pct * (Decimal::ONE - improvement)).max(Decimal::ZERO);

    // Per-unit costs scale with their deltas and with volume.
    let unit_cogs = product.cogs / product.orders;
    let new_cogs = unit_cogs * (Decimal::ONE + cogs_delta) * new_orders;
    let shipping_per_order = product.shipping / product.orders;
    let new_shipping = shipping_per_order * new_orders;
    let new_ad_spend = product.ad_spend * (Decimal::ONE + ad_delta);

    let new_gross = new_orders * new_unit_price;
    let new_returns = new_gross * new_return_rate / HUNDRED;

    Contribution {
        net_profit: (new_gross - new_returns) - new_cogs - new_ad_spend - new_shipping,
        revenue: new_gross - new_returns,
        gross_sales: new_gross,
        orders: new_orders,
    }
}

/// What one product contributes when the scenario leaves it untouched.
fn baseline(product: &ProductBaseline) -> Contribution {
    let returns = product.gross_sales * product.return_rate_pct / HUNDRED;
    Contribution {
        net_profit: product.net_profit(),
        revenue: product.gross_sales - returns,
        gross_sales: product.gross_sales,
        orders: product.orders,
    }
}

/// Evaluates one scenario against a snapshot. Pure: writes nothing, reads no
/// storage, and the same input always produces the same result.
///
/// In portfolio scope the deltas apply uniformly to every product including
/// the rest-of-store bucket; in product scope only the targeted product is
/// perturbed and all others hold at their baseline.
pub fn simulate(
    input: &SimulationInput,
    scenario: &Scenario,
    params: &ElasticityParams,
) -> Result<SimulationResult, SimulationError> {
    let target = match scenario.scope {
        SimulationScope::Portfolio => {
            // Killing is a per-product decision; a portfolio-wide kill would
            // silently zero the whole store.
            if scenario.is_killed {
                return Err(SimulationError::KillRequiresTarget);
            }
            None
        }
        SimulationScope::Product => {
            let target = scenario
                .target_variant_id
                .as_deref()
                .ok_or(SimulationError::MissingTarget)?;
            if !input.products.iter().any(|p| p.variant_id == target) {
                return Err(SimulationError::UnknownTarget(target.to_string()));
            }
            Some(target)
        }
    };

    let old_net_profit = input.old_net_profit();

    let mut new_net_profit = Decimal::ZERO;
    let mut new_revenue = Decimal::ZERO;
    let mut new_gross_sales = Decimal::ZERO;
    let mut new_orders = Decimal::ZERO;

    for product in &input.products {
        let perturbed = match target {
            // Portfolio scope: everything moves.
            None => perturb(product, scenario, params),
            // Product scope: only the target moves.
            Some(t) if product.variant_id == t => perturb(product, scenario, params),
            Some(_) => baseline(product),
        };
        new_net_profit += perturbed.net_profit;
        new_revenue += perturbed.revenue;
        new_gross_sales += perturbed.gross_sales;
        new_orders += perturbed.orders;
    }

    Ok(SimulationResult {
        old_net_profit,
        new_net_profit,
        profit_delta: new_net_profit - old_net_profit,
        new_revenue,
        new_gross_sales,
        new_orders,
    })
}
