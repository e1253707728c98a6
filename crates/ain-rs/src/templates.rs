//! Built-in prompt template library.
//!
//! Templates are pure data. Each one expands into a handful of blocks with
//! the development time budget interpolated. Loading a template replaces
//! the block collection with those blocks (type `template`).

use crate::error::{AinError, Result};
use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateCategory {
    WebApp,
    MobileApp,
    AiAssistant,
    DataAnalysis,
    Ecommerce,
    Productivity,
}

impl TemplateCategory {
    pub const ALL: [TemplateCategory; 6] = [
        Self::WebApp,
        Self::MobileApp,
        Self::AiAssistant,
        Self::DataAnalysis,
        Self::Ecommerce,
        Self::Productivity,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::WebApp => "web-app",
            Self::MobileApp => "mobile-app",
            Self::AiAssistant => "ai-assistant",
            Self::DataAnalysis => "data-analysis",
            Self::Ecommerce => "ecommerce",
            Self::Productivity => "productivity",
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match self {
            Self::WebApp => language.pick("Web App", "Webアプリ"),
            Self::MobileApp => language.pick("Mobile App", "モバイルアプリ"),
            Self::AiAssistant => language.pick("AI Assistant", "AIアシスタント"),
            Self::DataAnalysis => language.pick("Data Analysis", "データ分析"),
            Self::Ecommerce => language.pick("E-commerce", "Eコマース"),
            Self::Productivity => language.pick("Productivity", "生産性"),
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TemplateCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s.trim())
            .ok_or_else(|| format!("unknown template category: {s}"))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn label(self, language: Language) -> &'static str {
        match self {
            Self::Beginner => language.pick("Beginner", "初心者"),
            Self::Intermediate => language.pick("Intermediate", "中級者"),
            Self::Advanced => language.pick("Advanced", "上級者"),
        }
    }
}

/// A library entry, localized and with the time budget applied.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: TemplateCategory,
    pub difficulty: Difficulty,
    pub estimated_months: u32,
    pub features: Vec<String>,
    pub blocks: Vec<String>,
}

/// English and Japanese variants of one string.
type Text = (&'static str, &'static str);

struct TemplateDef {
    id: &'static str,
    name: Text,
    description: Text,
    category: TemplateCategory,
    difficulty: Difficulty,
    /// Offset from the development time budget and its lower bound.
    estimate: (i64, u32),
    features: [Text; 4],
    /// `{months}` is replaced by the development time budget.
    blocks: [Text; 4],
}

const LIBRARY: [TemplateDef; 6] = [
    TemplateDef {
        id: "saas-web-app",
        name: ("SaaS Web Application", "SaaS Webアプリケーション"),
        description: (
            "Complete template for building a SaaS web application with user management",
            "ユーザー管理機能付きSaaS Webアプリケーション構築用の完全テンプレート",
        ),
        category: TemplateCategory::WebApp,
        difficulty: Difficulty::Intermediate,
        estimate: (0, 0),
        features: [
            ("User Authentication", "ユーザー認証"),
            ("Subscription Management", "サブスクリプション管理"),
            ("Dashboard", "ダッシュボード"),
            ("API Integration", "API統合"),
        ],
        blocks: [
            (
                "Project Context: Build a SaaS web application for {months} months development timeline",
                "プロジェクトコンテキスト: {months}ヶ月の開発期間でSaaS Webアプリケーションを構築",
            ),
            (
                "Core Features: User authentication, subscription management, dashboard, API integration",
                "コア機能: ユーザー認証、サブスクリプション管理、ダッシュボード、API統合",
            ),
            (
                "Technical Requirements: React/Next.js frontend, Node.js backend, PostgreSQL database, Stripe payments",
                "技術要件: React/Next.jsフロントエンド、Node.jsバックエンド、PostgreSQLデータベース、Stripe決済",
            ),
            (
                "Deployment: Cloud hosting with CI/CD pipeline, monitoring, and security best practices",
                "デプロイ: CI/CDパイプライン、モニタリング、セキュリティベストプラクティス付きクラウドホスティング",
            ),
        ],
    },
    TemplateDef {
        id: "ai-chatbot",
        name: ("AI Chatbot Assistant", "AIチャットボットアシスタント"),
        description: (
            "Intelligent chatbot with natural language processing capabilities",
            "自然言語処理機能を持つインテリジェントチャットボット",
        ),
        category: TemplateCategory::AiAssistant,
        difficulty: Difficulty::Advanced,
        estimate: (-2, 4),
        features: [
            ("NLP Processing", "自然言語処理"),
            ("Context Awareness", "コンテキスト認識"),
            ("Multi-turn Conversations", "マルチターン会話"),
            ("Intent Recognition", "意図認識"),
        ],
        blocks: [
            (
                "AI Assistant Context: Develop an intelligent chatbot for {months} months timeline",
                "AIアシスタントコンテキスト: {months}ヶ月の期間でインテリジェントチャットボットを開発",
            ),
            (
                "NLP Features: Intent recognition, entity extraction, context awareness, multi-turn conversations",
                "NLP機能: 意図認識、エンティティ抽出、コンテキスト認識、マルチターン会話",
            ),
            (
                "AI Integration: OpenAI GPT, Anthropic Claude, or Google Gemini API integration",
                "AI統合: OpenAI GPT、Anthropic Claude、またはGoogle Gemini API統合",
            ),
            (
                "Deployment: Scalable backend with real-time messaging and conversation history",
                "デプロイ: リアルタイムメッセージングと会話履歴を持つスケーラブルバックエンド",
            ),
        ],
    },
    TemplateDef {
        id: "mobile-app",
        name: ("Cross-Platform Mobile App", "クロスプラットフォームモバイルアプリ"),
        description: (
            "React Native app with offline capabilities and push notifications",
            "オフライン機能とプッシュ通知付きReact Nativeアプリ",
        ),
        category: TemplateCategory::MobileApp,
        difficulty: Difficulty::Intermediate,
        estimate: (-1, 3),
        features: [
            ("Cross-Platform", "クロスプラットフォーム"),
            ("Offline Sync", "オフライン同期"),
            ("Push Notifications", "プッシュ通知"),
            ("App Store Ready", "アプリストア対応"),
        ],
        blocks: [
            (
                "Mobile App Context: Create cross-platform mobile application in {months} months",
                "モバイルアプリコンテキスト: {months}ヶ月でクロスプラットフォームモバイルアプリケーションを作成",
            ),
            (
                "Platform Features: iOS and Android compatibility, offline data sync, push notifications",
                "プラットフォーム機能: iOS・Android対応、オフラインデータ同期、プッシュ通知",
            ),
            (
                "Technology Stack: React Native, Expo, Firebase/Supabase backend, AsyncStorage",
                "技術スタック: React Native、Expo、Firebase/Supabaseバックエンド、AsyncStorage",
            ),
            (
                "App Store: Deployment to Apple App Store and Google Play Store with proper CI/CD",
                "アプリストア: 適切なCI/CDでApple App StoreとGoogle Play Storeにデプロイ",
            ),
        ],
    },
    TemplateDef {
        id: "data-analytics",
        name: ("Data Analytics Platform", "データ分析プラットフォーム"),
        description: (
            "Business intelligence dashboard with real-time data visualization",
            "リアルタイムデータ可視化付きビジネスインテリジェンスダッシュボード",
        ),
        category: TemplateCategory::DataAnalysis,
        difficulty: Difficulty::Advanced,
        estimate: (2, 6),
        features: [
            ("Real-time Analytics", "リアルタイム分析"),
            ("Data Visualization", "データ可視化"),
            ("ETL Pipelines", "ETLパイプライン"),
            ("ML Integration", "ML統合"),
        ],
        blocks: [
            (
                "Analytics Platform Context: Build comprehensive data analytics solution in {months} months",
                "分析プラットフォームコンテキスト: {months}ヶ月で包括的データ分析ソリューションを構築",
            ),
            (
                "Data Processing: ETL pipelines, real-time streaming, data warehousing, ML model integration",
                "データ処理: ETLパイプライン、リアルタイムストリーミング、データウェアハウジング、MLモデル統合",
            ),
            (
                "Visualization: Interactive dashboards, custom charts, drill-down capabilities, export features",
                "可視化: インタラクティブダッシュボード、カスタムチャート、ドリルダウン機能、エクスポート機能",
            ),
            (
                "Infrastructure: Cloud data warehouse, API layer, caching, security and access control",
                "インフラ: クラウドデータウェアハウス、APIレイヤー、キャッシング、セキュリティ・アクセス制御",
            ),
        ],
    },
    TemplateDef {
        id: "ecommerce-platform",
        name: ("E-commerce Platform", "Eコマースプラットフォーム"),
        description: (
            "Full-featured online store with payment processing and inventory management",
            "決済処理と在庫管理機能付きフル機能オンラインストア",
        ),
        category: TemplateCategory::Ecommerce,
        difficulty: Difficulty::Intermediate,
        estimate: (1, 5),
        features: [
            ("Payment Processing", "決済処理"),
            ("Inventory Management", "在庫管理"),
            ("Order Tracking", "注文追跡"),
            ("Admin Panel", "管理パネル"),
        ],
        blocks: [
            (
                "E-commerce Context: Develop complete online store platform in {months} months",
                "Eコマースコンテキスト: {months}ヶ月で完全なオンラインストアプラットフォームを開発",
            ),
            (
                "Store Features: Product catalog, shopping cart, checkout, order management, customer accounts",
                "ストア機能: 商品カタログ、ショッピングカート、チェックアウト、注文管理、顧客アカウント",
            ),
            (
                "Payment & Shipping: Stripe/PayPal integration, tax calculation, shipping options, inventory tracking",
                "決済・配送: Stripe/PayPal統合、税計算、配送オプション、在庫追跡",
            ),
            (
                "Admin Panel: Product management, order processing, analytics, customer support tools",
                "管理パネル: 商品管理、注文処理、分析、カスタマーサポートツール",
            ),
        ],
    },
    TemplateDef {
        id: "productivity-app",
        name: ("Productivity Application", "生産性アプリケーション"),
        description: (
            "Task management and collaboration tool with team features",
            "チーム機能付きタスク管理・コラボレーションツール",
        ),
        category: TemplateCategory::Productivity,
        difficulty: Difficulty::Beginner,
        estimate: (-1, 3),
        features: [
            ("Task Management", "タスク管理"),
            ("Team Collaboration", "チームコラボレーション"),
            ("Time Tracking", "時間追跡"),
            ("Reporting", "レポート"),
        ],
        blocks: [
            (
                "Productivity App Context: Create team productivity solution in {months} months",
                "生産性アプリコンテキスト: {months}ヶ月でチーム生産性ソリューションを作成",
            ),
            (
                "Core Features: Task management, project planning, time tracking, team collaboration",
                "コア機能: タスク管理、プロジェクト計画、時間追跡、チームコラボレーション",
            ),
            (
                "Collaboration: Real-time updates, comments, file sharing, notifications, calendar integration",
                "コラボレーション: リアルタイム更新、コメント、ファイル共有、通知、カレンダー統合",
            ),
            (
                "Analytics: Productivity metrics, reporting, goal tracking, performance insights",
                "分析: 生産性メトリクス、レポート、目標追跡、パフォーマンス洞察",
            ),
        ],
    },
];

impl TemplateDef {
    fn localize(&self, language: Language, development_time: u32) -> PromptTemplate {
        let pick = |(en, ja): Text| language.pick(en, ja).to_string();
        let (offset, floor) = self.estimate;
        let estimated = (i64::from(development_time) + offset).max(i64::from(floor));
        PromptTemplate {
            id: self.id.to_string(),
            name: pick(self.name),
            description: pick(self.description),
            category: self.category,
            difficulty: self.difficulty,
            estimated_months: u32::try_from(estimated).unwrap_or(floor),
            features: self.features.iter().copied().map(pick).collect(),
            blocks: self
                .blocks
                .iter()
                .map(|(en, ja)| {
                    language
                        .pick(en, ja)
                        .replace("{months}", &development_time.to_string())
                })
                .collect(),
        }
    }
}

/// The six built-in templates, localized, with `development_time` applied.
pub fn template_library(language: Language, development_time: u32) -> Vec<PromptTemplate> {
    LIBRARY
        .iter()
        .map(|def| def.localize(language, development_time))
        .collect()
}

/// Look up one template by id.
pub fn find_template(id: &str, language: Language, development_time: u32) -> Result<PromptTemplate> {
    LIBRARY
        .iter()
        .find(|def| def.id == id)
        .map(|def| def.localize(language, development_time))
        .ok_or_else(|| AinError::UnknownTemplate(id.to_string()))
}

/// Templates whose name, description or features contain `query`
/// (case-insensitive), optionally restricted to one category.
pub fn search_templates<'a>(
    templates: &'a [PromptTemplate],
    query: &str,
    category: Option<TemplateCategory>,
) -> Vec<&'a PromptTemplate> {
    let needle = query.trim().to_lowercase();
    templates
        .iter()
        .filter(|t| category.is_none_or(|c| t.category == c))
        .filter(|t| {
            needle.is_empty()
                || t.name.to_lowercase().contains(&needle)
                || t.description.to_lowercase().contains(&needle)
                || t.features.iter().any(|f| f.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_has_six_templates_with_four_blocks() {
        let library = template_library(Language::En, 6);
        assert_eq!(library.len(), 6);
        assert!(library.iter().all(|t| t.blocks.len() == 4));
        let ids: Vec<&str> = library.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "saas-web-app",
                "ai-chatbot",
                "mobile-app",
                "data-analytics",
                "ecommerce-platform",
                "productivity-app",
            ]
        );
    }

    #[test]
    fn development_time_is_interpolated() {
        let saas = find_template("saas-web-app", Language::En, 9).unwrap();
        assert!(saas.blocks[0].contains("for 9 months"));
        assert_eq!(saas.estimated_months, 9);

        let ja = find_template("saas-web-app", Language::Ja, 4).unwrap();
        assert!(ja.blocks[0].contains("4ヶ月"));
    }

    #[test]
    fn estimates_respect_lower_bounds() {
        let library = template_library(Language::En, 1);
        let months: Vec<u32> = library.iter().map(|t| t.estimated_months).collect();
        assert_eq!(months, vec![1, 4, 3, 6, 5, 3]);

        let library = template_library(Language::En, 10);
        let months: Vec<u32> = library.iter().map(|t| t.estimated_months).collect();
        assert_eq!(months, vec![10, 8, 9, 12, 11, 9]);
    }

    #[test]
    fn unknown_template_is_an_error() {
        let err = find_template("nope", Language::En, 3).unwrap_err();
        assert!(matches!(err, AinError::UnknownTemplate(id) if id == "nope"));
    }

    #[test]
    fn search_matches_name_description_and_features() {
        let library = template_library(Language::En, 3);
        let hits = search_templates(&library, "stripe", None);
        assert!(hits.is_empty());
        let hits = search_templates(&library, "inventory", None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "ecommerce-platform");
        let hits = search_templates(&library, "", Some(TemplateCategory::MobileApp));
        assert_eq!(hits.len(), 1);
        let hits = search_templates(&library, "time tracking", Some(TemplateCategory::Productivity));
        assert_eq!(hits[0].id, "productivity-app");
    }

    #[test]
    fn category_parses_from_id() {
        assert_eq!(
            "ai-assistant".parse::<TemplateCategory>().unwrap(),
            TemplateCategory::AiAssistant
        );
        assert!("games".parse::<TemplateCategory>().is_err());
    }
}
