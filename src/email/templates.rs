//! Message bodies. Every template renders an HTML and a plain-text part and
//! escapes any text that came from users before it reaches the HTML.

use crate::reports::weekly::{CommentSample, TrendDirection, WeeklyReport};

const BRAND: &str = "Diz Aí";
const HEADER_STYLE: &str = "background: linear-gradient(135deg, #6366f1 0%, #8b5cf6 100%); padding: 24px 20px; border-radius: 8px 8px 0 0; text-align: center;";
const BODY_STYLE: &str = "background: #f9fafb; padding: 30px 20px; border-radius: 0 0 8px 8px;";
const BUTTON_STYLE: &str = "display: inline-block; background: #6366f1; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none; margin-top: 10px;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn dashboard_link(base_url: &str) -> String {
    format!("{}/dashboard", base_url.trim_end_matches('/'))
}

fn layout(title: &str, subtitle: Option<&str>, body: &str) -> String {
    let subtitle = subtitle
        .map(|s| {
            format!(
                r#"<p style="color: #e0e7ff; margin: 8px 0 0 0; font-size: 16px;">{}</p>"#,
                html_escape(s)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="{header}">
    <h1 style="color: white; margin: 0; font-size: 24px;">{title}</h1>
    {subtitle}
  </div>
  <div style="{body_style}">
    {body}
    <p style="color: #9ca3af; margin: 30px 0 0 0; font-size: 12px; text-align: center;">{brand} - Sistema de Coleta de Feedbacks</p>
  </div>
</div>"#,
        header = HEADER_STYLE,
        title = title,
        subtitle = subtitle,
        body_style = BODY_STYLE,
        body = body,
        brand = BRAND,
    )
}

pub fn negative_feedback_alert(
    establishment_name: &str,
    comment: Option<&str>,
    base_url: &str,
) -> EmailContent {
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());
    let link = dashboard_link(base_url);

    let comment_html = comment
        .map(|c| {
            format!(
                r#"<p style="color: #1f2937; margin: 10px 0 0 0;"><strong>Comentário:</strong> {}</p>"#,
                html_escape(c)
            )
        })
        .unwrap_or_default();
    let body = format!(
        r#"<h2 style="color: #1f2937; margin-top: 0;">Feedback Negativo Recebido</h2>
    <p style="color: #6b7280;">Um cliente deixou um feedback negativo no seu estabelecimento.</p>
    <div style="background: white; border-left: 4px solid #ef4444; padding: 15px; margin: 20px 0; border-radius: 4px;">
      <p style="color: #1f2937; margin: 0;"><strong>Estabelecimento:</strong> {name}</p>
      <p style="color: #1f2937; margin: 10px 0 0 0;"><strong>Avaliação:</strong> Negativa</p>
      {comment}
    </div>
    <p style="color: #6b7280;">Acesse seu painel para mais detalhes e para agir rapidamente.</p>
    <a href="{link}" style="{button}">Ver Painel</a>"#,
        name = html_escape(establishment_name),
        comment = comment_html,
        link = html_escape(&link),
        button = BUTTON_STYLE,
    );

    let mut text = format!(
        "Feedback negativo recebido.\n\nEstabelecimento: {}\nAvaliação: Negativa\n",
        establishment_name
    );
    if let Some(c) = comment {
        text.push_str(&format!("Comentário: {}\n", c));
    }
    text.push_str(&format!("\nAcesse seu painel: {}\n", link));

    EmailContent {
        subject: format!("Alerta: Feedback negativo em {}", establishment_name),
        html: layout(BRAND, None, &body),
        text,
    }
}

fn trend_line(report: &WeeklyReport) -> Option<String> {
    let percent = report.trend.percent_change?;
    match report.trend.direction {
        TrendDirection::Increase => Some(format!("↑ {}% em relação à semana anterior", percent)),
        TrendDirection::Decrease => Some(format!(
            "↓ {}% em relação à semana anterior",
            percent.abs()
        )),
        TrendDirection::Flat => Some("Mesmo volume da semana anterior".to_string()),
    }
}

fn samples_html(samples: &[CommentSample], background: &str, border: &str) -> String {
    samples
        .iter()
        .map(|sample| {
            format!(
                r#"<div style="background: {bg}; border-left: 3px solid {border}; padding: 12px; margin: 8px 0; border-radius: 4px;">
        <p style="color: #1f2937; margin: 0; font-size: 14px;">{comment}</p>
        <p style="color: #9ca3af; margin: 5px 0 0 0; font-size: 12px;">{date}</p>
      </div>"#,
                bg = background,
                border = border,
                comment = html_escape(&sample.comment),
                date = sample.created_at.format("%d/%m %H:%M"),
            )
        })
        .collect()
}

fn samples_text(samples: &[CommentSample]) -> String {
    samples
        .iter()
        .map(|s| format!("- {} ({})\n", s.comment, s.created_at.format("%d/%m %H:%M")))
        .collect()
}

/// `is_test` prefixes the subject so manual sends are easy to tell apart.
pub fn weekly_report(
    establishment_name: &str,
    report: &WeeklyReport,
    base_url: &str,
    is_test: bool,
) -> EmailContent {
    let link = dashboard_link(base_url);
    let trend = trend_line(report);
    let trend_color = match report.trend.direction {
        TrendDirection::Decrease => "#ef4444",
        _ => "#10b981",
    };
    let trend_html = trend
        .as_deref()
        .map(|t| {
            format!(
                r#"<p style="color: {}; margin: 5px 0 0 0; font-size: 14px;">{}</p>"#,
                trend_color, t
            )
        })
        .unwrap_or_default();

    let mut sections = String::new();
    if !report.negative_comments.is_empty() {
        sections.push_str(&format!(
            r#"<div style="background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px;">
      <h3 style="color: #1f2937; margin: 0 0 15px 0; font-size: 18px;">⚠️ Feedbacks Negativos (Ação Necessária)</h3>
      {}
    </div>"#,
            samples_html(&report.negative_comments, "#fef2f2", "#ef4444")
        ));
    }
    if !report.positive_comments.is_empty() {
        sections.push_str(&format!(
            r#"<div style="background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px;">
      <h3 style="color: #1f2937; margin: 0 0 15px 0; font-size: 18px;">⭐ Destaques Positivos</h3>
      {}
    </div>"#,
            samples_html(&report.positive_comments, "#f0fdf4", "#10b981")
        ));
    }

    let body = format!(
        r#"<div style="background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px;">
      <h2 style="color: #1f2937; margin: 0 0 15px 0; font-size: 20px;">Resumo da Semana</h2>
      <div style="text-align: center; margin-bottom: 15px;">
        <p style="color: #6b7280; margin: 0; font-size: 14px;">Total de Feedbacks</p>
        <p style="color: #1f2937; margin: 5px 0 0 0; font-size: 36px; font-weight: bold;">{total}</p>
        {trend}
      </div>
      <p style="color: #1f2937; text-align: center; margin: 0 0 15px 0;">Taxa de felicidade: <strong>{happiness}%</strong></p>
      <table style="width: 100%; text-align: center;">
        <tr>
          <td style="padding: 10px; background: #fef2f2; border-radius: 6px;"><strong>{bad}</strong><br>NEGATIVOS<br>{bad_share}%</td>
          <td style="padding: 10px; background: #fef9e7; border-radius: 6px;"><strong>{okay}</strong><br>NEUTROS<br>{okay_share}%</td>
          <td style="padding: 10px; background: #f0fdf4; border-radius: 6px;"><strong>{great}</strong><br>POSITIVOS<br>{great_share}%</td>
        </tr>
      </table>
    </div>
    {sections}
    <div style="text-align: center; margin-top: 25px;">
      <p style="color: #6b7280; margin: 0 0 15px 0;">Acesse seu painel para ver todos os detalhes</p>
      <a href="{link}" style="{button}">Ver Painel Completo</a>
    </div>"#,
        total = report.total,
        trend = trend_html,
        happiness = report.happiness,
        bad = report.counts.bad,
        okay = report.counts.okay,
        great = report.counts.great,
        bad_share = report.shares.bad,
        okay_share = report.shares.okay,
        great_share = report.shares.great,
        sections = sections,
        link = html_escape(&link),
        button = BUTTON_STYLE,
    );

    let mut text = format!(
        "Relatório Semanal - {name}\n\n\
         Total de feedbacks: {total}\n\
         Taxa de felicidade: {happiness}%\n\
         Negativos: {bad} ({bad_share}%)\n\
         Neutros: {okay} ({okay_share}%)\n\
         Positivos: {great} ({great_share}%)\n",
        name = establishment_name,
        total = report.total,
        happiness = report.happiness,
        bad = report.counts.bad,
        bad_share = report.shares.bad,
        okay = report.counts.okay,
        okay_share = report.shares.okay,
        great = report.counts.great,
        great_share = report.shares.great,
    );
    if let Some(t) = &trend {
        text.push_str(&format!("{}\n", t));
    }
    if !report.negative_comments.is_empty() {
        text.push_str("\nFeedbacks negativos:\n");
        text.push_str(&samples_text(&report.negative_comments));
    }
    if !report.positive_comments.is_empty() {
        text.push_str("\nDestaques positivos:\n");
        text.push_str(&samples_text(&report.positive_comments));
    }
    text.push_str(&format!("\nVer painel completo: {}\n", link));

    let prefix = if is_test { "[TESTE] " } else { "" };
    EmailContent {
        subject: format!("{}Relatório Semanal - {}", prefix, establishment_name),
        html: layout("📊 Relatório Semanal", Some(establishment_name), &body),
        text,
    }
}

pub fn test_email() -> EmailContent {
    let body = r#"<p style="color: #1f2937; font-size: 16px;">
      Se você está lendo isso, a configuração de e-mail do <strong>Diz Aí</strong> está funcionando corretamente!
    </p>
    <p style="color: #6b7280; font-size: 14px;">Os relatórios semanais serão enviados toda segunda-feira.</p>"#;
    EmailContent {
        subject: format!("Teste de Email - {}", BRAND),
        html: layout("✅ Email Funcionando!", None, body),
        text: format!(
            "Email funcionando!\n\nSe você está lendo isso, a configuração de e-mail do {} está funcionando corretamente.\n",
            BRAND
        ),
    }
}
