//! Table rendering for fit diagnostics, distributions and ticket bundles.

use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::domain::{Bundle, Distribution, FitArtifact};
use crate::fit::FitMetrics;

pub fn tabulate_distribution(dist: &Distribution) -> Table {
    Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Outcome".into(), "Probability".into()],
        ))
        .with_rows(vec![
            Row::new(Styles::default(), vec!["Home".into(), format!("{:.3}", dist.p_home).into()]),
            Row::new(Styles::default(), vec!["Draw".into(), format!("{:.3}", dist.p_draw).into()]),
            Row::new(Styles::default(), vec!["Away".into(), format!("{:.3}", dist.p_away).into()]),
            Row::new(
                Styles::default(),
                vec!["Entropy".into(), format!("{:.3}", dist.entropy).into()],
            ),
        ])
}

pub fn tabulate_fit_metrics(metrics: &FitMetrics) -> Table {
    Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(18)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Metric".into(), "Value".into()],
        ))
        .with_rows(vec![
            Row::new(Styles::default(), vec!["Brier score".into(), format!("{:.4}", metrics.brier_score).into()]),
            Row::new(Styles::default(), vec!["Log loss".into(), format!("{:.4}", metrics.log_loss).into()]),
            Row::new(
                Styles::default(),
                vec!["Categorical accuracy".into(), format!("{:.3}", metrics.categorical_accuracy).into()],
            ),
            Row::new(Styles::default(), vec!["Draw accuracy".into(), format!("{:.3}", metrics.draw_accuracy).into()]),
            Row::new(Styles::default(), vec!["RMSE".into(), format!("{:.4}", metrics.rmse).into()]),
            Row::new(
                Styles::default(),
                vec!["Holdout matches".into(), metrics.holdout_matches.to_string().into()],
            ),
        ])
}

pub fn tabulate_fit_artifact(artifact: &FitArtifact) -> Table {
    Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(18)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Parameter".into(), "Value".into()],
        ))
        .with_rows(vec![
            Row::new(
                Styles::default(),
                vec!["Home advantage".into(), format!("{:.4}", artifact.home_advantage).into()],
            ),
            Row::new(Styles::default(), vec!["Rho".into(), format!("{:.4}", artifact.rho).into()]),
            Row::new(
                Styles::default(),
                vec!["Iterations".into(), artifact.metadata.iterations.to_string().into()],
            ),
            Row::new(
                Styles::default(),
                vec!["Max delta".into(), format!("{:.6}", artifact.metadata.max_delta).into()],
            ),
            Row::new(
                Styles::default(),
                vec!["Teams fitted".into(), artifact.attack.len().to_string().into()],
            ),
        ])
}

pub fn tabulate_bundle(bundle: &Bundle) -> Table {
    Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(6)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(Left)),
            Col::new(Styles::default().with(MinWidth(14)).with(Left)),
            Col::new(Styles::default().with(MinWidth(30)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "#".into(),
                "Role".into(),
                "Archetype".into(),
                "Picks".into(),
                "EV".into(),
            ],
        ))
        .with_rows(bundle.tickets.iter().enumerate().map(|(index, ticket)| {
            let picks = ticket
                .picks
                .iter()
                .map(|pick| pick.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Row::new(
                Styles::default(),
                vec![
                    (index + 1).to_string().into(),
                    format!("{:?}", ticket.role).into(),
                    format!("{:?}", ticket.archetype).into(),
                    picks.into(),
                    format!("{:.4}", ticket.diagnostics.ev_score).into(),
                ],
            )
        }))
}
